//! Text cleanup and packaging-boilerplate classification
//!
//! Box faces carry plenty of text that is not the title: player counts, age
//! ratings, play time and credits. Those lines nearly always pair a number with
//! one of a small set of words, which is what [`MetadataFilter`] looks for.

use std::collections::HashSet;

/// Boilerplate keywords printed on bilingual (English / Portuguese) packaging.
///
/// Matched against cleaned, lower-cased tokens, so accented words appear in
/// their accent-stripped form.
pub const DEFAULT_METADATA_KEYWORDS: &[&str] = &[
    // player count
    "player", "players", "jogador", "jogadores",
    // age
    "age", "ages", "year", "years", "idade", "idades", "ano", "anos",
    // duration
    "min", "mins", "minute", "minutes", "minuto", "minutos", "hour", "hours", "hora", "horas",
    // credits
    "author", "authors", "autor", "autores", "designer", "designers", "publisher", "editora",
];

/// Clean a raw detector string.
///
/// Newlines become spaces, everything except ASCII letters, digits and spaces
/// is dropped, and whitespace runs collapse to a single space.
pub fn clean_text(raw: &str) -> String {
    let stripped: String = raw
        .replace(['\n', '\r'], " ")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect();

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Classifies cleaned text as packaging metadata or a likely title
#[derive(Debug, Clone)]
pub struct MetadataFilter {
    keywords: HashSet<String>,
}

impl MetadataFilter {
    /// Create a filter over the given keywords (case-insensitive)
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// Number of distinct keywords
    pub fn keyword_count(&self) -> usize {
        self.keywords.len()
    }

    /// True when `cleaned` contains a digit and a boilerplate keyword token.
    ///
    /// A token also counts when the keyword is glued to a leading number, as in
    /// `"45min"` or `"10anos"`. Titles with a numeral but no keyword pass.
    pub fn is_likely_metadata(&self, cleaned: &str) -> bool {
        let lower = cleaned.to_lowercase();

        if !lower.chars().any(|c| c.is_ascii_digit()) {
            return false;
        }

        lower.split_whitespace().any(|token| {
            let word = token.trim_start_matches(|c: char| c.is_ascii_digit());
            !word.is_empty() && self.keywords.contains(word)
        })
    }
}

impl Default for MetadataFilter {
    fn default() -> Self {
        Self::new(DEFAULT_METADATA_KEYWORDS)
    }
}
