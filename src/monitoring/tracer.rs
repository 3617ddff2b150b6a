/*!
 * Structured Tracing
 * Subscriber setup for the engine's tracing events
 */

use crate::config::EngineConfig;
use tracing::info;
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
///
/// Returns `false` if a subscriber was already installed.
pub fn init_tracing(json: bool) -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .is_ok()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
            .is_ok()
    };

    if installed {
        info!(json, "Structured tracing initialized");
    }
    installed
}

/// Install the subscriber, reading the output format from `ABAC_TRACE_JSON`
///
/// An invalid environment falls back to compact output.
pub fn init_tracing_from_env() -> bool {
    let json = EngineConfig::from_env()
        .map(|config| config.trace_json)
        .unwrap_or(false);
    init_tracing(json)
}
