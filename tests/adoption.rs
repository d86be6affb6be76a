//! Adoption behavior: chain flattening, circular detection, and foreign
//! thenables, well-behaved and otherwise.

use std::sync::Arc;

use adeferred::test_utils::init_test_logging;
use adeferred::{Deferred, Fault, FulfillFn, RejectFn, Resolution, Scheduler, Thenable};
use parking_lot::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
enum TestError {
    Boom(&'static str),
    Machinery(Fault),
}

impl From<Fault> for TestError {
    fn from(fault: Fault) -> Self {
        Self::Machinery(fault)
    }
}

#[test]
fn fulfilling_with_a_pending_chain_adopts_its_value() {
    init_test_logging();
    let (scheduler, queue) = Scheduler::manual();
    let (inner, inner_resolver) = Deferred::<i32, TestError>::pair(scheduler.clone());
    let (outer, outer_resolver) = Deferred::<i32, TestError>::pair(scheduler);

    outer_resolver.fulfill(inner);
    queue.run_until_idle();
    // The inner deferred is still pending, so the outer must be too.
    assert!(outer.is_pending());

    inner_resolver.fulfill(Resolution::value(7));
    queue.run_until_idle();
    assert_eq!(outer.try_settled(), Some(Ok(7)));
}

#[test]
fn fulfilling_with_a_settled_chain_short_circuits() {
    init_test_logging();
    let (scheduler, queue) = Scheduler::manual();
    let settled = Deferred::<i32, TestError>::new(scheduler.clone(), |resolver| {
        resolver.fulfill(Resolution::value(11));
        Ok(())
    });
    let (outer, outer_resolver) = Deferred::<i32, TestError>::pair(scheduler);

    outer_resolver.fulfill(settled);
    queue.run_until_idle();
    assert_eq!(outer.try_settled(), Some(Ok(11)));
}

#[test]
fn adopting_a_rejected_chain_rejects() {
    init_test_logging();
    let (scheduler, queue) = Scheduler::manual();
    let (inner, inner_resolver) = Deferred::<i32, TestError>::pair(scheduler.clone());
    let (outer, outer_resolver) = Deferred::<i32, TestError>::pair(scheduler);

    outer_resolver.fulfill(inner);
    inner_resolver.reject(TestError::Boom("inner"));
    queue.run_until_idle();
    assert_eq!(outer.try_settled(), Some(Err(TestError::Boom("inner"))));
}

#[test]
fn handler_returning_a_deferred_is_flattened() {
    init_test_logging();
    let (scheduler, queue) = Scheduler::manual();
    let (inner, inner_resolver) = Deferred::<i32, TestError>::pair(scheduler.clone());
    let chained = Deferred::<i32, TestError>::new(scheduler, |resolver| {
        resolver.fulfill(Resolution::value(1));
        Ok(())
    })
    .and_then(move |_| inner);

    queue.run_until_idle();
    assert!(chained.is_pending());

    inner_resolver.fulfill(Resolution::value(42));
    queue.run_until_idle();
    assert_eq!(chained.try_settled(), Some(Ok(42)));
}

#[test]
fn long_settled_chains_flatten_without_extra_turns() {
    init_test_logging();
    let (scheduler, queue) = Scheduler::manual();
    let mut link = Deferred::<i32, TestError>::resolved(scheduler.clone(), Resolution::value(64));
    for _ in 0..256 {
        let (next, resolver) = Deferred::pair(scheduler.clone());
        resolver.fulfill(link);
        link = next;
    }
    // Every hop short-circuited through an already-settled chain, so the
    // value is visible without pumping a single turn.
    assert!(queue.is_empty());
    assert_eq!(link.try_settled(), Some(Ok(64)));
}

#[test]
fn self_resolution_rejects_with_circular_fault() {
    init_test_logging();
    let (scheduler, queue) = Scheduler::manual();
    let (deferred, resolver) = Deferred::<i32, TestError>::pair(scheduler);

    resolver.fulfill(deferred.clone());
    queue.run_until_idle();
    assert_eq!(
        deferred.try_settled(),
        Some(Err(TestError::Machinery(Fault::Circular)))
    );
}

/// A cooperative foreign implementation: fulfills synchronously on
/// subscription.
struct EagerThenable(i32);

impl Thenable<i32, TestError> for EagerThenable {
    fn subscribe(
        self: Box<Self>,
        fulfill: FulfillFn<i32, TestError>,
        _reject: RejectFn<TestError>,
    ) -> Result<(), TestError> {
        fulfill(Resolution::value(self.0));
        Ok(())
    }
}

/// A misbehaving foreign implementation: invokes both halves.
struct DoubleSettling;

impl Thenable<i32, TestError> for DoubleSettling {
    fn subscribe(
        self: Box<Self>,
        fulfill: FulfillFn<i32, TestError>,
        reject: RejectFn<TestError>,
    ) -> Result<(), TestError> {
        fulfill(Resolution::value(1));
        reject(TestError::Boom("late reject"));
        Ok(())
    }
}

/// A foreign implementation that fulfills and then errors out of
/// subscription anyway.
struct ErrsAfterFulfill;

impl Thenable<i32, TestError> for ErrsAfterFulfill {
    fn subscribe(
        self: Box<Self>,
        fulfill: FulfillFn<i32, TestError>,
        _reject: RejectFn<TestError>,
    ) -> Result<(), TestError> {
        fulfill(Resolution::value(5));
        Err(TestError::Boom("subscribe failed"))
    }
}

/// A foreign implementation whose subscription fails outright.
struct BrokenThenable;

impl Thenable<i32, TestError> for BrokenThenable {
    fn subscribe(
        self: Box<Self>,
        _fulfill: FulfillFn<i32, TestError>,
        _reject: RejectFn<TestError>,
    ) -> Result<(), TestError> {
        Err(TestError::Boom("no subscription"))
    }
}

/// A foreign implementation that fulfills with another thenable.
struct NestedThenable;

impl Thenable<i32, TestError> for NestedThenable {
    fn subscribe(
        self: Box<Self>,
        fulfill: FulfillFn<i32, TestError>,
        _reject: RejectFn<TestError>,
    ) -> Result<(), TestError> {
        fulfill(Resolution::foreign(EagerThenable(99)));
        Ok(())
    }
}

#[test]
fn foreign_thenable_is_adopted() {
    init_test_logging();
    let (scheduler, queue) = Scheduler::manual();
    let deferred =
        Deferred::<i32, TestError>::resolved(scheduler, Resolution::foreign(EagerThenable(23)));
    queue.run_until_idle();
    assert_eq!(deferred.try_settled(), Some(Ok(23)));
}

#[test]
fn double_settling_thenable_is_suppressed() {
    init_test_logging();
    let (scheduler, queue) = Scheduler::manual();
    let deferred =
        Deferred::<i32, TestError>::resolved(scheduler, Resolution::foreign(DoubleSettling));
    queue.run_until_idle();
    assert_eq!(deferred.try_settled(), Some(Ok(1)));
}

#[test]
fn subscribe_error_after_settlement_is_suppressed() {
    init_test_logging();
    let (scheduler, queue) = Scheduler::manual();
    let deferred =
        Deferred::<i32, TestError>::resolved(scheduler, Resolution::foreign(ErrsAfterFulfill));
    queue.run_until_idle();
    assert_eq!(deferred.try_settled(), Some(Ok(5)));
}

#[test]
fn subscribe_error_rejects_when_nothing_settled() {
    init_test_logging();
    let (scheduler, queue) = Scheduler::manual();
    let deferred =
        Deferred::<i32, TestError>::resolved(scheduler, Resolution::foreign(BrokenThenable));
    queue.run_until_idle();
    assert_eq!(
        deferred.try_settled(),
        Some(Err(TestError::Boom("no subscription")))
    );
}

#[test]
fn nested_thenables_unwrap_recursively() {
    init_test_logging();
    let (scheduler, queue) = Scheduler::manual();
    let deferred =
        Deferred::<i32, TestError>::resolved(scheduler, Resolution::foreign(NestedThenable));
    queue.run_until_idle();
    assert_eq!(deferred.try_settled(), Some(Ok(99)));
}

#[test]
fn native_deferred_interoperates_through_the_thenable_seam() {
    init_test_logging();
    let (scheduler, queue) = Scheduler::manual();
    let inner = Deferred::<i32, TestError>::new(scheduler.clone(), |resolver| {
        resolver.fulfill(Resolution::value(8));
        Ok(())
    });
    let adopted = Deferred::<i32, TestError>::resolved(scheduler, Resolution::foreign(inner));
    queue.run_until_idle();
    assert_eq!(adopted.try_settled(), Some(Ok(8)));

    let seen = Arc::new(Mutex::new(None));
    let observer = Arc::clone(&seen);
    let _continuation = adopted.and_then(move |n| {
        *observer.lock() = Some(n);
        Ok::<_, TestError>(n)
    });
    queue.run_until_idle();
    assert_eq!(*seen.lock(), Some(8));
}
