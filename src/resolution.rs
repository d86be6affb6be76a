//! Handler outcomes and foreign-thenable adoption.
//!
//! A [`Resolution`] is what a handler or initializer hands back to the
//! machinery: a plain value, another deferred to adopt, a foreign
//! [`Thenable`] to adopt, or a raised failure. The adopt loop in the
//! `deferred` module unwraps chains and thenables until a terminal value
//! or reason remains, so a stored fulfillment is never itself an
//! unresolved container.

use std::fmt;

use crate::deferred::Deferred;

/// One-shot fulfillment half of an adoption pair.
///
/// Receives a further [`Resolution`], which the adopting deferred unwraps
/// again: a thenable may legitimately fulfill with another thenable.
pub type FulfillFn<T, E> = Box<dyn FnOnce(Resolution<T, E>) + Send>;

/// One-shot rejection half of an adoption pair.
///
/// Reasons are opaque and are never unwrapped.
pub type RejectFn<E> = Box<dyn FnOnce(E) + Send>;

/// The outcome a handler or initializer hands back to the machinery.
pub enum Resolution<T, E> {
    /// Settle with a plain value.
    Value(T),
    /// Adopt another deferred's eventual state.
    Chain(Deferred<T, E>),
    /// Adopt a foreign thenable's eventual state.
    Foreign(Box<dyn Thenable<T, E>>),
    /// A raised failure; rejects verbatim, never unwrapped.
    Fault(E),
}

impl<T, E> Resolution<T, E> {
    /// A plain value resolution.
    pub fn value(value: T) -> Self {
        Self::Value(value)
    }

    /// A resolution adopting `chained`'s eventual state.
    pub fn chain(chained: Deferred<T, E>) -> Self {
        Self::Chain(chained)
    }

    /// A resolution adopting a foreign thenable's eventual state.
    pub fn foreign(thenable: impl Thenable<T, E> + 'static) -> Self {
        Self::Foreign(Box::new(thenable))
    }

    /// A raised failure.
    pub fn fault(reason: E) -> Self {
        Self::Fault(reason)
    }
}

impl<T, E> From<Deferred<T, E>> for Resolution<T, E> {
    fn from(chained: Deferred<T, E>) -> Self {
        Self::Chain(chained)
    }
}

impl<T, E> From<Result<T, E>> for Resolution<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Value(value),
            Err(reason) => Self::Fault(reason),
        }
    }
}

impl<T, E> fmt::Debug for Resolution<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let variant = match self {
            Self::Value(_) => "Value",
            Self::Chain(_) => "Chain",
            Self::Foreign(_) => "Foreign",
            Self::Fault(_) => "Fault",
        };
        write!(f, "Resolution::{variant}")
    }
}

/// Capability check for foreign promise-like values.
///
/// Anything that can register a settlement pair can be adopted by a
/// [`Deferred`]; the trait is the typed rendition of duck-typed "has a
/// callable `then`" detection, so foreign implementations interoperate
/// with native chains.
pub trait Thenable<T, E>: Send {
    /// Registers the settlement pair with the foreign value.
    ///
    /// The pair is one-shot-guarded by the adopting side: if the thenable
    /// invokes both halves, only the first has any effect. An `Err` from
    /// this method rejects the adopting deferred, unless the pair was
    /// already claimed.
    fn subscribe(self: Box<Self>, fulfill: FulfillFn<T, E>, reject: RejectFn<E>)
    -> Result<(), E>;
}
