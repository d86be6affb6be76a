//! Test helpers exposed under the `test-internals` feature.

/// Installs a tracing subscriber writing to the test harness output.
///
/// Call first in every test; repeated calls are no-ops.
pub fn init_test_logging() {
    #[cfg(feature = "test-internals")]
    {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .try_init();
    }
}
