//! Optional tracing integration.
//!
//! With the `tracing-integration` feature enabled these macros forward to
//! `tracing`; otherwise they compile to nothing.

#[cfg(feature = "tracing-integration")]
macro_rules! trace_event {
    ($($arg:tt)*) => { tracing::trace!($($arg)*) };
}

#[cfg(not(feature = "tracing-integration"))]
macro_rules! trace_event {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "tracing-integration")]
macro_rules! warn_event {
    ($($arg:tt)*) => { tracing::warn!($($arg)*) };
}

#[cfg(not(feature = "tracing-integration"))]
macro_rules! warn_event {
    ($($arg:tt)*) => {};
}

pub(crate) use {trace_event, warn_event};
