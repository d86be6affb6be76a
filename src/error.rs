//! Machinery fault taxonomy.
//!
//! [`Fault`] covers errors raised by the deferred machinery itself, as
//! opposed to rejection reasons supplied by user code. Resolution paths
//! that can raise one carry an `E: From<Fault>` bound so the fault surfaces
//! as an ordinary rejection of the affected deferred, while staying
//! distinguishable from expected failures.

use thiserror::Error;

/// An error raised by the deferred machinery rather than by user code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Fault {
    /// A deferred was resolved with itself.
    #[error("deferred resolved with itself")]
    Circular,
}
