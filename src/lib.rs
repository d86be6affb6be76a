//! Adeferred: settle-once, adoption-correct, scheduler-injected deferred values.
//!
//! # Overview
//!
//! A [`Deferred`] represents the eventual result of an asynchronous
//! operation. Observers attach reactions before or after the result is
//! known; reactions never run synchronously in the turn that attaches or
//! triggers them. The deferred-callback facility that runs them is an
//! explicit collaborator (a [`Scheduler`]), never an ambient global, so the
//! whole primitive can be driven deterministically in tests.
//!
//! # Core Guarantees
//!
//! - **Settle once**: a deferred leaves `Pending` at most once; later
//!   settlement calls are no-ops, and the stored value never changes
//! - **No synchronous reactions**: every reaction crosses the injected
//!   scheduler, even when attached after settlement
//! - **Adoption-correct chaining**: resolving with another deferred or a
//!   [`Thenable`] adopts its eventual state instead of settling with the
//!   container itself; self-resolution rejects with [`Fault::Circular`]
//! - **Contained failures**: initializer and handler failures become
//!   rejections of the affected deferred; nothing escapes `then`, `catch`,
//!   [`all`], or [`race`] as a raw failure
//!
//! # Module Structure
//!
//! - [`deferred`]: the state machine, reaction registration, constructors
//! - [`resolution`]: handler outcomes and the [`Thenable`] adoption seam
//! - [`combinator`]: the `all` and `race` aggregate combinators
//! - [`defer`]: the scheduling seam ([`Defer`], [`TickQueue`], [`WorkerQueue`])
//! - [`error`]: machinery faults, distinct from user rejection reasons
//!
//! # Quick Start
//!
//! ```
//! use adeferred::{Deferred, Fault, Resolution, Scheduler};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! enum Error {
//!     Machinery(Fault),
//! }
//!
//! impl From<Fault> for Error {
//!     fn from(fault: Fault) -> Self {
//!         Self::Machinery(fault)
//!     }
//! }
//!
//! let (scheduler, queue) = Scheduler::manual();
//! let doubled = Deferred::<i32, Error>::new(scheduler, |resolver| {
//!     resolver.fulfill(Resolution::value(21));
//!     Ok(())
//! })
//! .and_then(|n| Ok(n * 2));
//!
//! queue.run_until_idle();
//! assert_eq!(doubled.try_settled(), Some(Ok(42)));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]

pub mod combinator;
pub mod defer;
pub mod deferred;
pub mod error;
pub mod resolution;

mod tracing_compat;

#[cfg(any(test, feature = "test-internals"))]
pub mod test_utils;

pub use combinator::{all, race};
pub use defer::{Defer, Scheduler, Thunk, TickQueue, WorkerQueue};
pub use deferred::{Deferred, Resolver};
pub use error::Fault;
pub use resolution::{FulfillFn, RejectFn, Resolution, Thenable};
