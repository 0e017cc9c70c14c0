//! # Structured Logging
//!
//! Installs the global `tracing` subscriber. Log output is either human
//! readable or JSON, filtered by `RUST_LOG` when set and by the configured
//! level otherwise.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::{Error, Result};

/// Initialize the global logging subscriber.
///
/// Fails if the filter directive is invalid or a subscriber is already set.
pub fn init_logging(config: &Config) -> Result<()> {
    let filter = build_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.json_logging {
        registry.with(fmt::layer().json().with_current_span(true)).try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };

    result.map_err(|e| Error::internal(format!("Failed to initialize logging: {}", e)))
}

fn build_filter(config: &Config) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.log_level)
            .map_err(|e| Error::config(format!("Invalid log level '{}': {}", config.log_level, e))),
    }
}

/// Log the effective configuration at startup, without secrets.
pub fn log_config_info(config: &Config) {
    tracing::info!(
        service_name = %config.service_name,
        traces_endpoint = %config.traces_endpoint,
        export_enabled = config.api_key.is_some(),
        doc_traces_ratio = config.doc_traces_ratio,
        sample_ratio = config.sample_ratio,
        max_payload_size = config.max_payload_size,
        schemify_doc_span_payload = config.schemify_doc_span_payload,
        mask_debug_span_payload = config.mask_debug_span_payload,
        "Instrumentation configuration loaded"
    );
}
