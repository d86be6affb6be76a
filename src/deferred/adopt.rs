//! One-shot adoption pairs for chained and foreign settlements.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::Fault;
use crate::resolution::{FulfillFn, RejectFn, Resolution};

use super::Inner;

/// Claim token shared by the two halves of an adoption pair.
///
/// A misbehaving thenable may invoke both halves; whichever claims first
/// settles the target and the other half is a no-op.
#[derive(Clone)]
pub(crate) struct AdoptionGuard {
    claimed: Arc<AtomicBool>,
}

impl AdoptionGuard {
    fn new() -> Self {
        Self {
            claimed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// True for exactly one caller across all clones.
    pub(crate) fn claim(&self) -> bool {
        !self.claimed.swap(true, Ordering::AcqRel)
    }
}

/// The settlement pair handed to an adopted deferred or thenable.
pub(crate) struct AdoptionPair<T, E> {
    target: Arc<Inner<T, E>>,
    guard: AdoptionGuard,
}

impl<T, E> AdoptionPair<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + From<Fault> + 'static,
{
    pub(crate) fn new(target: Arc<Inner<T, E>>) -> Self {
        Self {
            target,
            guard: AdoptionGuard::new(),
        }
    }

    /// Splits into the `(fulfill, reject)` halves plus the shared guard
    /// for the subscribe-error path.
    ///
    /// The fulfill half feeds its resolution back through the target's
    /// adopt loop, so a thenable fulfilling with another thenable keeps
    /// unwrapping.
    pub(crate) fn split(self) -> (FulfillFn<T, E>, RejectFn<E>, AdoptionGuard) {
        let Self { target, guard } = self;
        let fulfill_guard = guard.clone();
        let reject_guard = guard.clone();
        let fulfill_target = Arc::clone(&target);
        let reject_target = target;
        let fulfill: FulfillFn<T, E> = Box::new(move |resolution: Resolution<T, E>| {
            if fulfill_guard.claim() {
                fulfill_target.resolve(resolution);
            }
        });
        let reject: RejectFn<E> = Box::new(move |reason: E| {
            if reject_guard.claim() {
                reject_target.reject(reason);
            }
        });
        (fulfill, reject, guard)
    }
}
