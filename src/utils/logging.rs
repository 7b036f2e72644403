//! Logging initialization for hosts embedding the mod loader
//!
//! - Respects the RUST_LOG environment variable (always takes precedence)
//! - Falls back to the filter from the loader configuration
//! - Defaults to "info"
//!
//! # Usage
//! ```rust
//! use modhost::utils::init_logging;
//!
//! init_logging(None); // Uses RUST_LOG or defaults to "info"
//! ```

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ModLoaderConfig;

fn env_filter(filter: Option<&str>) -> EnvFilter {
    if std::env::var("RUST_LOG").is_ok() {
        return EnvFilter::from_default_env();
    }
    EnvFilter::new(filter.unwrap_or("info"))
}

/// Initialize human-readable logging to stderr
///
/// Does nothing if a global subscriber is already installed, so hosts that set up
/// their own tracing stack keep it.
///
/// # Arguments
/// * `filter` - Optional log filter (e.g., "info", "modhost::module=debug")
pub fn init_logging(filter: Option<&str>) {
    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_ansi(std::env::var("NO_COLOR").is_err()),
        )
        .with(env_filter(filter))
        .try_init();
}

/// Initialize logging with JSON output (for log aggregation)
#[cfg(feature = "json-logging")]
pub fn init_json_logging(filter: Option<&str>) {
    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .json()
                .with_target(true)
                .with_current_span(true)
                .with_span_list(true),
        )
        .with(env_filter(filter))
        .try_init();
}

/// Initialize logging from the loader configuration
pub fn init_logging_from_config(config: &ModLoaderConfig) {
    init_logging(config.log_filter.as_deref());
}
