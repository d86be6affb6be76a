//! Manually pumped deterministic tick queue.

use crossbeam_queue::SegQueue;

use super::{Defer, Thunk};

/// A deterministic FIFO thunk queue, pumped manually.
///
/// Nothing runs until the owner pumps the queue, and thunks run in exactly
/// the order they were deferred. A running thunk may defer further thunks;
/// those land at the back of the queue, matching macrotask semantics.
#[derive(Debug, Default)]
pub struct TickQueue {
    queue: SegQueue<Thunk>,
}

impl TickQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued thunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// True if no thunks are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Runs the next queued thunk. Returns false if the queue was empty.
    pub fn run_once(&self) -> bool {
        match self.queue.pop() {
            Some(thunk) => {
                thunk();
                true
            }
            None => false,
        }
    }

    /// Runs thunks until the queue is empty, including thunks deferred
    /// while draining. Returns the number of thunks run.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while self.run_once() {
            ran += 1;
        }
        ran
    }
}

impl Defer for TickQueue {
    fn defer(&self, thunk: Thunk) {
        self.queue.push(thunk);
    }
}
