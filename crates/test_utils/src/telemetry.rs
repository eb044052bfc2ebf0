//! One-shot tracing initialization for test binaries

use once_cell::sync::Lazy;

static INIT: Lazy<()> = Lazy::new(|| {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
});

/// Initializes the global tracing subscriber once per test binary.
/// Safe to call from every test; later calls are no-ops.
pub fn init_tracing() {
    Lazy::force(&INIT);
}
