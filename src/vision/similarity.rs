//! String similarity based on Levenshtein edit distance
//!
//! Used to group noisy OCR readings of the same title ("Catan", "Catnn", "Gatan").

/// Levenshtein edit distance between two strings, counted in `char`s.
///
/// Single-row dynamic programming: the row is sized after the shorter input,
/// so memory is O(min(len(a), len(b))).
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    let (long, short) = if a_chars.len() >= b_chars.len() {
        (a_chars, b_chars)
    } else {
        (b_chars, a_chars)
    };

    if short.is_empty() {
        return long.len();
    }

    let mut row: Vec<usize> = (0..=short.len()).collect();

    for (i, long_char) in long.iter().enumerate() {
        // row[0] before overwrite is the diagonal for column 1
        let mut diagonal = row[0];
        row[0] = i + 1;

        for (j, short_char) in short.iter().enumerate() {
            let cost = if long_char == short_char { 0 } else { 1 };
            let above = row[j + 1];
            row[j + 1] = (above + 1).min(row[j] + 1).min(diagonal + cost);
            diagonal = above;
        }
    }

    row[short.len()]
}

/// Normalized similarity in `[0.0, 1.0]`: `1 - distance / max(len(a), len(b))`.
///
/// Symmetric, and `similarity(s, s) == 1.0` for every `s` including `""`.
/// Comparison is case-sensitive; callers normalize beforehand.
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }

    1.0 - levenshtein_distance(a, b) as f64 / max_len as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("", ""), 0);
        assert_eq!(levenshtein_distance("abc", ""), 3);
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("flaw", "lawn"), 2);
        assert_eq!(levenshtein_distance("Catan", "Catnn"), 1);
    }

    #[test]
    fn test_identical_strings_are_fully_similar() {
        for s in ["", "a", "Catan", "Ticket to Ride", "7 Wonders Duel"] {
            assert_eq!(similarity(s, s), 1.0, "similarity({s:?}, {s:?})");
        }
    }

    #[test]
    fn test_similarity_is_symmetric() {
        let samples = ["", "Catan", "Gatan", "Carcassonne", "Azul", "Wingspan", "Wingspam 2"];
        for a in samples {
            for b in samples {
                assert_eq!(similarity(a, b), similarity(b, a), "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn test_similarity_range_and_values() {
        assert!((similarity("Catan", "Catnn") - 0.8).abs() < 1e-9);
        assert!((similarity("hello", "hallo") - 0.8).abs() < 1e-9);
        assert_eq!(similarity("abc", ""), 0.0);
        assert_eq!(similarity("abc", "xyz"), 0.0);

        let s = similarity("Pandemic", "Pandemlc Legacy");
        assert!((0.0..=1.0).contains(&s));
    }

    #[test]
    fn test_similarity_is_case_sensitive() {
        assert!(similarity("CATAN", "catan") < 0.5);
    }

    #[test]
    fn test_matches_strsim_reference() {
        let samples = [
            ("", ""),
            ("Catan", "Gatan"),
            ("Dixit", "Dlxlt Odyssey"),
            ("Terraforming Mars", "Terrafomring Mras"),
            ("Código Secreto", "Codigo Secreto"),
        ];
        for (a, b) in samples {
            assert_eq!(levenshtein_distance(a, b), strsim::levenshtein(a, b), "{a:?} vs {b:?}");
            assert!((similarity(a, b) - strsim::normalized_levenshtein(a, b)).abs() < 1e-9);
        }
    }
}
