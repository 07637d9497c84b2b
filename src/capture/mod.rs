//! Camera hand-off
//!
//! The camera produces frames faster than they can be analyzed. Frames go
//! through a single-slot mailbox: a new frame replaces one that is still
//! waiting, and the replaced frame is released on the spot.

pub mod frame;

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Notify;
use tracing::trace;

pub use frame::Frame;

#[derive(Debug, Default)]
struct SlotState {
    pending: Option<Frame>,
    closed: bool,
}

/// Newest-wins mailbox between the camera and the analyzer worker
#[derive(Debug, Default)]
pub struct FrameSlot {
    state: Mutex<SlotState>,
    notify: Notify,
    received: AtomicU64,
    dropped: AtomicU64,
}

impl FrameSlot {
    /// Create an open, empty slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a frame to the analyzer.
    ///
    /// Replaces any frame still waiting. Returns `false` if the slot is closed,
    /// in which case the frame is released immediately.
    pub fn push(&self, frame: Frame) -> bool {
        self.received.fetch_add(1, Ordering::Relaxed);

        let mut state = self.state.lock();
        if state.closed {
            drop(state);
            drop(frame);
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        let stale = state.pending.replace(frame);
        drop(state);
        self.notify.notify_one();

        if let Some(stale) = stale {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            trace!("Dropped unprocessed frame {}", stale.sequence);
        }
        true
    }

    /// Wait for the next frame.
    ///
    /// Returns `None` once the slot is closed and nothing is pending.
    pub async fn next(&self) -> Option<Frame> {
        loop {
            let notified = self.notify.notified();
            {
                let mut state = self.state.lock();
                if let Some(frame) = state.pending.take() {
                    return Some(frame);
                }
                if state.closed {
                    return None;
                }
            }
            notified.await;
        }
    }

    /// Stop accepting frames. A frame already waiting is still delivered.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.notify.notify_one();
    }

    /// Release a waiting frame without delivering it
    pub fn discard_pending(&self) {
        let discarded = self.state.lock().pending.take();
        if discarded.is_some() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Frames offered so far
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    /// Frames released without being analyzed
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
