//! The deferred-value state machine.
//!
//! A [`Deferred`] is a cheaply cloneable handle to a settlement cell that
//! moves from pending to exactly one terminal state. Reactions attach
//! before or after settlement and always run through the injected
//! [`Scheduler`], never synchronously in the attaching or settling turn,
//! so callers cannot observe whether a deferred settled before or after a
//! reaction was registered.

mod adopt;

use std::fmt;
use std::mem;
use std::sync::Arc;

use parking_lot::Mutex;
use smallvec::SmallVec;

use crate::defer::Scheduler;
use crate::error::Fault;
use crate::resolution::{FulfillFn, RejectFn, Resolution, Thenable};
use crate::tracing_compat::trace_event;

use adopt::AdoptionPair;

/// Reaction queued while pending; receives its own clone of the settlement.
pub(crate) type Reaction<V> = Box<dyn FnOnce(V) + Send>;

/// Inline capacity for the reaction queues. Most deferreds carry at most a
/// chained continuation and one adoption pair.
const INLINE_REACTIONS: usize = 2;

type Reactions<V> = SmallVec<[Reaction<V>; INLINE_REACTIONS]>;

enum State<T, E> {
    Pending {
        on_fulfilled: Reactions<T>,
        on_rejected: Reactions<E>,
    },
    Fulfilled(T),
    Rejected(E),
}

pub(crate) struct Inner<T, E> {
    scheduler: Scheduler,
    state: Mutex<State<T, E>>,
}

/// A deferred value: the eventual result of an asynchronous operation.
///
/// Clones share one settlement cell; settling any clone settles them all.
pub struct Deferred<T, E> {
    inner: Arc<Inner<T, E>>,
}

impl<T, E> Clone for Deferred<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Settlement capability handed to initializers and returned by
/// [`Deferred::pair`].
///
/// Cloneable and sendable; the first settlement wins and later calls are
/// no-ops, so a resolver can be handed to several racing producers.
pub struct Resolver<T, E> {
    inner: Arc<Inner<T, E>>,
}

impl<T, E> Clone for Resolver<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, E> Deferred<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn pending(scheduler: Scheduler) -> Self {
        Self {
            inner: Arc::new(Inner {
                scheduler,
                state: Mutex::new(State::Pending {
                    on_fulfilled: SmallVec::new(),
                    on_rejected: SmallVec::new(),
                }),
            }),
        }
    }

    /// Creates a deferred immediately rejected with `reason`, verbatim.
    ///
    /// Rejection reasons are opaque: no unwrapping ever applies to them.
    #[must_use]
    pub fn rejected(scheduler: Scheduler, reason: E) -> Self {
        let deferred = Self::pending(scheduler);
        deferred.inner.reject(reason);
        deferred
    }

    /// True while the deferred has not settled.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(*self.inner.state.lock(), State::Pending { .. })
    }

    /// The settled outcome, if any.
    #[must_use]
    pub fn try_settled(&self) -> Option<Result<T, E>> {
        match &*self.inner.state.lock() {
            State::Pending { .. } => None,
            State::Fulfilled(value) => Some(Ok(value.clone())),
            State::Rejected(reason) => Some(Err(reason.clone())),
        }
    }

    /// The scheduler this deferred settles through.
    #[must_use]
    pub fn scheduler(&self) -> &Scheduler {
        &self.inner.scheduler
    }

    /// Registers a raw reaction pair, bypassing continuation plumbing.
    pub(crate) fn subscribe_raw(&self, on_fulfilled: Reaction<T>, on_rejected: Reaction<E>) {
        self.inner.subscribe(on_fulfilled, on_rejected);
    }
}

impl<T, E> Deferred<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + From<Fault> + 'static,
{
    /// Creates a deferred and synchronously runs `init` with its resolver.
    ///
    /// An `Err` from the initializer rejects the deferred; it never
    /// propagates out of the constructor.
    pub fn new<F>(scheduler: Scheduler, init: F) -> Self
    where
        F: FnOnce(Resolver<T, E>) -> Result<(), E>,
    {
        let deferred = Self::pending(scheduler);
        let resolver = Resolver {
            inner: Arc::clone(&deferred.inner),
        };
        if let Err(reason) = init(resolver) {
            deferred.inner.reject(reason);
        }
        deferred
    }

    /// A pending deferred plus its external settlement handle.
    #[must_use]
    pub fn pair(scheduler: Scheduler) -> (Self, Resolver<T, E>) {
        let deferred = Self::pending(scheduler);
        let resolver = Resolver {
            inner: Arc::clone(&deferred.inner),
        };
        (deferred, resolver)
    }

    /// Returns a deferred resolved with `resolution`.
    ///
    /// A [`Resolution::Chain`] is returned unchanged (no wrapping); plain
    /// values settle immediately and thenables are adopted, consistent
    /// with construction-time semantics.
    #[must_use]
    pub fn resolved(scheduler: Scheduler, resolution: impl Into<Resolution<T, E>>) -> Self {
        match resolution.into() {
            Resolution::Chain(chained) => chained,
            other => {
                let deferred = Self::pending(scheduler);
                deferred.inner.resolve(other);
                deferred
            }
        }
    }

    /// Registers settlement handlers and returns the chain continuation.
    ///
    /// The continuation resolves with whatever the invoked handler hands
    /// back: values fulfill it, chained deferreds and thenables are
    /// adopted, and faults reject it. Handlers run via the scheduler,
    /// never in the turn that attaches or settles.
    pub fn then<U, F, R, G, S>(&self, on_fulfilled: F, on_rejected: G) -> Deferred<U, E>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> R + Send + 'static,
        R: Into<Resolution<U, E>>,
        G: FnOnce(E) -> S + Send + 'static,
        S: Into<Resolution<U, E>>,
    {
        let continuation = Deferred::pending(self.inner.scheduler.clone());
        let fulfill_target = Arc::clone(&continuation.inner);
        let reject_target = Arc::clone(&continuation.inner);
        self.inner.subscribe(
            Box::new(move |value: T| fulfill_target.resolve(on_fulfilled(value).into())),
            Box::new(move |reason: E| reject_target.resolve(on_rejected(reason).into())),
        );
        continuation
    }

    /// [`then`](Self::then) with the rejection side re-raising unchanged.
    pub fn and_then<U, F, R>(&self, on_fulfilled: F) -> Deferred<U, E>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> R + Send + 'static,
        R: Into<Resolution<U, E>>,
    {
        self.then(on_fulfilled, Resolution::Fault)
    }

    /// [`then`](Self::then) with the fulfillment side passing through.
    ///
    /// Returns the continuation; callers that need the chain value must
    /// keep forwarding it.
    pub fn catch<G, S>(&self, on_rejected: G) -> Deferred<T, E>
    where
        G: FnOnce(E) -> S + Send + 'static,
        S: Into<Resolution<T, E>>,
    {
        self.then(Resolution::Value, on_rejected)
    }
}

impl<T, E> Resolver<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Rejects with `reason`, verbatim. First settlement wins.
    pub fn reject(&self, reason: E) {
        self.inner.reject(reason);
    }
}

impl<T, E> Resolver<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + From<Fault> + 'static,
{
    /// Fulfills with `resolution`, unwrapping chains and thenables.
    ///
    /// First settlement wins; later calls are no-ops. Resolving with the
    /// deferred this resolver settles rejects with [`Fault::Circular`].
    pub fn fulfill(&self, resolution: impl Into<Resolution<T, E>>) {
        self.inner.resolve(resolution.into());
    }
}

impl<T, E> Thenable<T, E> for Deferred<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn subscribe(
        self: Box<Self>,
        fulfill: FulfillFn<T, E>,
        reject: RejectFn<E>,
    ) -> Result<(), E> {
        self.inner.subscribe(
            Box::new(move |value| fulfill(Resolution::Value(value))),
            reject,
        );
        Ok(())
    }
}

impl<T, E> Inner<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Registers a reaction pair. Pending queues them in registration
    /// order; settled schedules the matching reaction immediately. Neither
    /// runs synchronously in this call.
    fn subscribe(&self, on_fulfilled: Reaction<T>, on_rejected: Reaction<E>) {
        let mut state = self.state.lock();
        match &mut *state {
            State::Pending {
                on_fulfilled: fulfilled,
                on_rejected: rejected,
            } => {
                fulfilled.push(on_fulfilled);
                rejected.push(on_rejected);
            }
            State::Fulfilled(value) => {
                let value = value.clone();
                drop(state);
                self.scheduler.defer(Box::new(move || on_fulfilled(value)));
            }
            State::Rejected(reason) => {
                let reason = reason.clone();
                drop(state);
                self.scheduler.defer(Box::new(move || on_rejected(reason)));
            }
        }
    }

    /// Pending → Fulfilled. Schedules the queued fulfillment reactions in
    /// registration order, one scheduling each; rejection reactions are
    /// discarded. No-op if already settled.
    fn fulfill(&self, value: T) {
        let reactions = {
            let mut state = self.state.lock();
            let State::Pending { on_fulfilled, .. } = &mut *state else {
                return;
            };
            let reactions = mem::take(on_fulfilled);
            *state = State::Fulfilled(value.clone());
            reactions
        };
        trace_event!(reactions = reactions.len(), "deferred fulfilled");
        for reaction in reactions {
            let value = value.clone();
            self.scheduler.defer(Box::new(move || reaction(value)));
        }
    }

    /// Pending → Rejected, symmetric to [`fulfill`](Self::fulfill).
    fn reject(&self, reason: E) {
        let reactions = {
            let mut state = self.state.lock();
            let State::Pending { on_rejected, .. } = &mut *state else {
                return;
            };
            let reactions = mem::take(on_rejected);
            *state = State::Rejected(reason.clone());
            reactions
        };
        trace_event!(reactions = reactions.len(), "deferred rejected");
        for reaction in reactions {
            let reason = reason.clone();
            self.scheduler.defer(Box::new(move || reaction(reason)));
        }
    }
}

impl<T, E> Inner<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + From<Fault> + 'static,
{
    /// The adopt loop: unwraps a resolution until a terminal value or
    /// reason remains, then settles.
    ///
    /// Settled chains short-circuit iteratively, so long native chains
    /// cost neither stack depth nor extra scheduler turns. Pending chains
    /// and foreign thenables register a one-shot-guarded adoption pair and
    /// leave this deferred pending until the inner one settles.
    fn resolve(self: &Arc<Self>, resolution: Resolution<T, E>) {
        let mut next = resolution;
        loop {
            match next {
                Resolution::Value(value) => return self.fulfill(value),
                Resolution::Fault(reason) => return self.reject(reason),
                Resolution::Chain(chained) => {
                    if Arc::ptr_eq(&chained.inner, self) {
                        trace_event!("circular resolution rejected");
                        return self.reject(Fault::Circular.into());
                    }
                    match chained.try_settled() {
                        Some(Ok(value)) => next = Resolution::Value(value),
                        Some(Err(reason)) => next = Resolution::Fault(reason),
                        None => return self.adopt_chain(&chained),
                    }
                }
                Resolution::Foreign(thenable) => return self.adopt_foreign(thenable),
            }
        }
    }

    fn adopt_chain(self: &Arc<Self>, chained: &Deferred<T, E>) {
        let (fulfill, reject, _guard) = AdoptionPair::new(Arc::clone(self)).split();
        chained.inner.subscribe(
            Box::new(move |value| fulfill(Resolution::Value(value))),
            reject,
        );
    }

    fn adopt_foreign(self: &Arc<Self>, thenable: Box<dyn Thenable<T, E>>) {
        let (fulfill, reject, guard) = AdoptionPair::new(Arc::clone(self)).split();
        if let Err(reason) = thenable.subscribe(fulfill, reject) {
            // A thenable that errors after claiming the pair has already
            // settled this deferred; the late error is suppressed.
            if guard.claim() {
                self.reject(reason);
            }
        }
    }
}

impl<T, E> fmt::Debug for Deferred<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.inner.state.lock() {
            State::Pending { .. } => "pending",
            State::Fulfilled(_) => "fulfilled",
            State::Rejected(_) => "rejected",
        };
        f.debug_struct("Deferred").field("state", &state).finish()
    }
}

impl<T, E> fmt::Debug for Resolver<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver").finish_non_exhaustive()
    }
}
