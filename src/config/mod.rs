//! # Configuration Management
//!
//! Configuration for the instrumentation, read from environment variables.
//! Parsing goes through [`Config::from_lookup`] so tests can supply values
//! without touching the process environment.

use crate::constants::{
    MULTIPLAYER_MAX_HTTP_REQUEST_RESPONSE_SIZE, MULTIPLAYER_OTEL_DEFAULT_TRACES_EXPORTER_URL,
};
use crate::middleware::MiddlewareOptions;
use crate::{Error, Result};

/// Environment variable holding the Multiplayer API key
pub const ENV_OTLP_KEY: &str = "MULTIPLAYER_OTLP_KEY";
/// Environment variable overriding the trace export endpoint
pub const ENV_TRACES_ENDPOINT: &str = "MULTIPLAYER_OTLP_TRACES_ENDPOINT";
/// Environment variable with the ratio of traces picked for documentation
pub const ENV_DOC_TRACES_RATIO: &str = "MULTIPLAYER_DOC_TRACES_RATIO";
/// Environment variable with the ratio used for ordinary traces
pub const ENV_SAMPLE_RATIO: &str = "MULTIPLAYER_SAMPLE_RATIO";
/// Environment variable with a comma separated list of extra headers to mask
pub const ENV_HEADERS_TO_MASK: &str = "MULTIPLAYER_HEADERS_TO_MASK";
pub const ENV_MAX_PAYLOAD_SIZE: &str = "MULTIPLAYER_MAX_PAYLOAD_SIZE";
pub const ENV_SCHEMIFY_DOC_SPAN_PAYLOAD: &str = "MULTIPLAYER_SCHEMIFY_DOC_SPAN_PAYLOAD";
pub const ENV_MASK_DEBUG_SPAN_PAYLOAD: &str = "MULTIPLAYER_MASK_DEBUG_SPAN_PAYLOAD";
pub const ENV_SERVICE_NAME: &str = "SERVICE_NAME";
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
pub const ENV_JSON_LOGGING: &str = "JSON_LOGGING";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Service name reported on the tracing resource
    pub service_name: String,

    /// API key sent in the `Authorization` header; spans are not exported without it
    pub api_key: Option<String>,

    /// OTLP/HTTP trace endpoint
    pub traces_endpoint: String,

    /// Fraction of traces classified for documentation (0.0 to 1.0)
    pub doc_traces_ratio: f64,

    /// Fraction of unclassified traces sampled by the base sampler (0.0 to 1.0)
    pub sample_ratio: f64,

    /// Extra header names to mask, on top of the credential headers
    pub headers_to_mask: Vec<String>,

    /// Maximum recorded payload size in bytes
    pub max_payload_size: usize,

    /// Record the schema of documentation trace payloads
    pub schemify_doc_span_payload: bool,

    /// Mask debug trace payloads
    pub mask_debug_span_payload: bool,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "multiplayer-otel".to_string(),
            api_key: None,
            traces_endpoint: MULTIPLAYER_OTEL_DEFAULT_TRACES_EXPORTER_URL.to_string(),
            doc_traces_ratio: 0.0,
            sample_ratio: 1.0,
            headers_to_mask: Vec::new(),
            max_payload_size: MULTIPLAYER_MAX_HTTP_REQUEST_RESPONSE_SIZE,
            schemify_doc_span_payload: true,
            mask_debug_span_payload: true,
            log_level: "info".to_string(),
            json_logging: false,
        }
    }
}

impl Config {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let config = Self {
            service_name: get(ENV_SERVICE_NAME).unwrap_or(defaults.service_name),
            api_key: get(ENV_OTLP_KEY),
            traces_endpoint: get(ENV_TRACES_ENDPOINT).unwrap_or(defaults.traces_endpoint),
            doc_traces_ratio: parse_ratio(ENV_DOC_TRACES_RATIO, get(ENV_DOC_TRACES_RATIO))?
                .unwrap_or(defaults.doc_traces_ratio),
            sample_ratio: parse_ratio(ENV_SAMPLE_RATIO, get(ENV_SAMPLE_RATIO))?
                .unwrap_or(defaults.sample_ratio),
            headers_to_mask: get(ENV_HEADERS_TO_MASK)
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|name| !name.is_empty())
                        .map(str::to_ascii_lowercase)
                        .collect()
                })
                .unwrap_or_default(),
            max_payload_size: get(ENV_MAX_PAYLOAD_SIZE)
                .map(|v| {
                    v.parse::<usize>().map_err(|e| {
                        Error::config(format!("Invalid {}: {}", ENV_MAX_PAYLOAD_SIZE, e))
                    })
                })
                .transpose()?
                .unwrap_or(defaults.max_payload_size),
            schemify_doc_span_payload: parse_bool(
                ENV_SCHEMIFY_DOC_SPAN_PAYLOAD,
                get(ENV_SCHEMIFY_DOC_SPAN_PAYLOAD),
            )?
            .unwrap_or(defaults.schemify_doc_span_payload),
            mask_debug_span_payload: parse_bool(
                ENV_MASK_DEBUG_SPAN_PAYLOAD,
                get(ENV_MASK_DEBUG_SPAN_PAYLOAD),
            )?
            .unwrap_or(defaults.mask_debug_span_payload),
            log_level: get(ENV_LOG_LEVEL).unwrap_or(defaults.log_level),
            json_logging: parse_bool(ENV_JSON_LOGGING, get(ENV_JSON_LOGGING))?
                .unwrap_or(defaults.json_logging),
        };

        Ok(config)
    }

    /// Build the capture middleware options from this configuration
    pub fn middleware_options(&self) -> MiddlewareOptions {
        MiddlewareOptions::new()
            .with_headers_to_mask(&self.headers_to_mask)
            .with_max_payload_size(self.max_payload_size)
            .with_schemify_doc_span_payload(self.schemify_doc_span_payload)
            .with_mask_debug_span_payload(self.mask_debug_span_payload)
    }
}

fn parse_ratio(key: &str, value: Option<String>) -> Result<Option<f64>> {
    let Some(value) = value else { return Ok(None) };
    let ratio: f64 =
        value.parse().map_err(|e| Error::config(format!("Invalid {}: {}", key, e)))?;
    if !(0.0..=1.0).contains(&ratio) {
        return Err(Error::config(format!("{} must be between 0 and 1, got {}", key, ratio)));
    }
    Ok(Some(ratio))
}

fn parse_bool(key: &str, value: Option<String>) -> Result<Option<bool>> {
    let Some(value) = value else { return Ok(None) };
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(Some(true)),
        "false" | "0" | "no" => Ok(Some(false)),
        other => Err(Error::config(format!("Invalid {}: expected a boolean, got '{}'", key, other))),
    }
}
