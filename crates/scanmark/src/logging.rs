//! Tracing subscriber setup.
//!
//! The db layer logs through the `log` facade while the pipeline emits
//! tracing spans; the `tracing-log` bridge funnels both into one
//! subscriber. Filtering follows `RUST_LOG`, defaulting to `info`.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Initializes the global subscriber. Safe to call more than once; only
/// the first call wins.
pub fn init_logging() {
    let _ = tracing_log::LogTracer::init();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
