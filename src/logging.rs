//! Logging setup.
//!
//! The library itself only emits `tracing` events and spans; applications
//! embedding it may call [`init`] once to install a subscriber. Standard `log`
//! records (reqwest and hyper emit those) are bridged into `tracing`.

use std::io;

use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Layer};

/// Default filter when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info";

/// Output format for [`init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines on stderr.
    #[default]
    Pretty,
    /// One JSON object per event on stderr.
    Json,
}

/// Install the global subscriber.
///
/// Returns `false` when a subscriber was already installed, which makes the
/// call safe to repeat (tests do).
pub fn init(format: LogFormat) -> bool {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let layer = match format {
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .with_target(true)
            .with_filter(env_filter)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .json()
            .with_thread_ids(true)
            .with_target(true)
            .with_filter(env_filter)
            .boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(layer);
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        return false;
    }

    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("Failed to initialize LogTracer: {}", e);
    }
    true
}
