//! First-settlement-wins aggregation.

use crate::defer::Scheduler;
use crate::deferred::Deferred;
use crate::error::Fault;
use crate::resolution::Resolution;

/// Settles with the outcome of whichever item settles first.
///
/// All items are started concurrently; later settlements are ignored by
/// the first-wins settlement guard. A race over no items never settles.
#[must_use]
pub fn race<T, E, I>(scheduler: Scheduler, items: I) -> Deferred<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + From<Fault> + 'static,
    I: IntoIterator,
    I::Item: Into<Resolution<T, E>>,
{
    let (aggregate, resolver) = Deferred::pair(scheduler.clone());

    for item in items {
        let wrapped = Deferred::resolved(scheduler.clone(), item);
        let fulfill_resolver = resolver.clone();
        let reject_resolver = resolver.clone();
        wrapped.subscribe_raw(
            Box::new(move |value: T| fulfill_resolver.fulfill(Resolution::Value(value))),
            Box::new(move |reason: E| reject_resolver.reject(reason)),
        );
    }

    aggregate
}
