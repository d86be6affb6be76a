//! Wait-for-all aggregation.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::defer::Scheduler;
use crate::deferred::Deferred;
use crate::error::Fault;
use crate::resolution::Resolution;

struct Gather<T> {
    slots: Vec<Option<T>>,
    outstanding: usize,
}

/// Waits for every item, collecting values in input order.
///
/// Fulfills with the settled values once every item has fulfilled; rejects
/// with the reason of the first item to reject. Pending siblings are not
/// cancelled; their eventual settlements are ignored. Empty input fulfills
/// with an empty vector.
#[must_use]
pub fn all<T, E, I>(scheduler: Scheduler, items: I) -> Deferred<Vec<T>, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + From<Fault> + 'static,
    I: IntoIterator,
    I::Item: Into<Resolution<T, E>>,
{
    let wrapped: Vec<Deferred<T, E>> = items
        .into_iter()
        .map(|item| Deferred::resolved(scheduler.clone(), item))
        .collect();

    if wrapped.is_empty() {
        return Deferred::resolved(scheduler, Resolution::Value(Vec::new()));
    }

    let (aggregate, resolver) = Deferred::pair(scheduler);
    let gather = Arc::new(Mutex::new(Gather {
        slots: vec![None; wrapped.len()],
        outstanding: wrapped.len(),
    }));

    for (index, item) in wrapped.into_iter().enumerate() {
        let fulfill_gather = Arc::clone(&gather);
        let fulfill_resolver = resolver.clone();
        let reject_resolver = resolver.clone();
        item.subscribe_raw(
            Box::new(move |value: T| {
                let mut gather = fulfill_gather.lock();
                gather.slots[index] = Some(value);
                gather.outstanding -= 1;
                if gather.outstanding == 0 {
                    let values = gather
                        .slots
                        .iter_mut()
                        .map(|slot| slot.take().expect("every slot filled at completion"))
                        .collect::<Vec<_>>();
                    drop(gather);
                    fulfill_resolver.fulfill(Resolution::Value(values));
                }
            }),
            Box::new(move |reason: E| reject_resolver.reject(reason)),
        );
    }

    aggregate
}
