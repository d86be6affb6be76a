//! Dedicated worker-thread scheduler.

use std::collections::VecDeque;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex};

use crate::tracing_compat::warn_event;

use super::{Defer, Thunk};

/// A FIFO scheduler backed by one dedicated worker thread.
///
/// Thunks run in the order deferred. A panicking thunk is contained and the
/// worker keeps draining. Dropping the queue shuts the worker down after
/// the thunks already queued have run.
pub struct WorkerQueue {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

struct Shared {
    inbox: Mutex<Inbox>,
    available: Condvar,
}

struct Inbox {
    thunks: VecDeque<Thunk>,
    shutdown: bool,
}

impl WorkerQueue {
    /// Spawns the worker thread.
    #[must_use]
    pub fn spawn() -> Self {
        let shared = Arc::new(Shared {
            inbox: Mutex::new(Inbox {
                thunks: VecDeque::new(),
                shutdown: false,
            }),
            available: Condvar::new(),
        });
        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("adeferred-worker".into())
            .spawn(move || run_worker(&worker_shared))
            .expect("spawn deferred-callback worker thread");
        Self {
            shared,
            worker: Some(worker),
        }
    }
}

fn run_worker(shared: &Shared) {
    loop {
        let thunk = {
            let mut inbox = shared.inbox.lock();
            loop {
                if let Some(thunk) = inbox.thunks.pop_front() {
                    break thunk;
                }
                if inbox.shutdown {
                    return;
                }
                shared.available.wait(&mut inbox);
            }
        };
        if panic::catch_unwind(AssertUnwindSafe(thunk)).is_err() {
            warn_event!("deferred thunk panicked; worker continues");
        }
    }
}

impl Defer for WorkerQueue {
    fn defer(&self, thunk: Thunk) {
        let mut inbox = self.shared.inbox.lock();
        inbox.thunks.push_back(thunk);
        drop(inbox);
        self.shared.available.notify_one();
    }
}

impl Drop for WorkerQueue {
    fn drop(&mut self) {
        {
            let mut inbox = self.shared.inbox.lock();
            inbox.shutdown = true;
        }
        self.shared.available.notify_one();
        if let Some(worker) = self.worker.take() {
            if worker.thread().id() == thread::current().id() {
                // Dropped from inside a thunk: the loop observes shutdown
                // and exits on its own; joining here would deadlock.
                drop(worker);
            } else {
                let _ = worker.join();
            }
        }
    }
}

impl fmt::Debug for WorkerQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerQueue").finish_non_exhaustive()
    }
}
