//! Deferred-callback scheduling seam.
//!
//! The primitive never invokes a reaction synchronously in the turn that
//! attaches or triggers it. Every invocation is handed to a [`Defer`]
//! implementation, which must run thunks after the current unit of work
//! completes, in FIFO order relative to other thunks on the same facility.
//! The facility is injected explicitly (no ambient global): tests drive
//! settlement deterministically with [`TickQueue`], production hosts use
//! [`WorkerQueue`] or plug in their own loop.

mod queue;
mod worker;

pub use queue::TickQueue;
pub use worker::WorkerQueue;

use std::fmt;
use std::sync::Arc;

/// A unit of deferred work.
pub type Thunk = Box<dyn FnOnce() + Send + 'static>;

/// Deferred-callback facility.
///
/// Implementations run thunks after the current unit of work completes, in
/// FIFO order relative to other thunks deferred on the same facility.
pub trait Defer: Send + Sync + 'static {
    /// Schedules `thunk` to run later. Must not run it within this call.
    fn defer(&self, thunk: Thunk);
}

/// Cheaply cloneable handle to a [`Defer`] facility.
#[derive(Clone)]
pub struct Scheduler {
    facility: Arc<dyn Defer>,
}

impl Scheduler {
    /// Wraps a [`Defer`] implementation.
    pub fn new(facility: impl Defer) -> Self {
        Self {
            facility: Arc::new(facility),
        }
    }

    /// Wraps an already shared [`Defer`] implementation.
    #[must_use]
    pub fn from_arc(facility: Arc<dyn Defer>) -> Self {
        Self { facility }
    }

    /// Creates a manually pumped deterministic scheduler.
    ///
    /// Returns the handle plus the queue to pump from the test or host
    /// loop.
    #[must_use]
    pub fn manual() -> (Self, Arc<TickQueue>) {
        let queue = Arc::new(TickQueue::new());
        let facility: Arc<dyn Defer> = queue.clone();
        (Self { facility }, queue)
    }

    /// Spawns a dedicated worker thread draining a FIFO queue.
    ///
    /// The worker shuts down once the last clone of the returned handle
    /// drops, after running the thunks already queued.
    #[must_use]
    pub fn worker() -> Self {
        Self::new(WorkerQueue::spawn())
    }

    /// Schedules `thunk` on the underlying facility.
    pub fn defer(&self, thunk: Thunk) {
        self.facility.defer(thunk);
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler").finish_non_exhaustive()
    }
}
