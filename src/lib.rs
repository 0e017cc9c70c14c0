//! # Multiplayer OTel
//!
//! OpenTelemetry extensions that let a service record HTTP payloads on a
//! subset of its traces.
//!
//! A trace is classified when its id is generated: ids starting with
//! `d0cd0c` are documentation traces, ids starting with `debdeb` are debug
//! traces, everything else is ordinary. Classified traces are always sampled,
//! and the axum capture middleware records their request and response headers
//! and bodies as span attributes, masked (debug) or reduced to a JSON schema
//! (documentation).
//!
//! ## Architecture
//!
//! ```text
//! RatioDependentIdGenerator → TraceIdBasedSampler → SdkTracerProvider → OTLP/HTTP
//!                                     ↑
//! trace_http_requests → capture_request → capture_response → handler
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use multiplayer_otel::{observability, Config, RatioDependentIdGenerator, Result};
//!
//! fn main() -> Result<()> {
//!     let config = Config::from_env()?;
//!     let generator = RatioDependentIdGenerator::new(config.doc_traces_ratio);
//!     let provider = observability::init_tracing(&config, generator)?;
//!     // serve requests...
//!     observability::shutdown_tracing(provider);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod constants;
pub mod errors;
pub mod middleware;
pub mod observability;
pub mod payload;
pub mod trace;

// Re-export commonly used types and traits
pub use config::Config;
pub use errors::{Error, Result};
pub use middleware::{capture_request, capture_response, MiddlewareOptions};
pub use trace::{RatioDependentIdGenerator, TraceClassification, TraceIdBasedSampler};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
