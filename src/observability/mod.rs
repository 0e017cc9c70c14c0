//! # Observability Infrastructure
//!
//! Logging setup, OTLP export, tracer provider wiring and the HTTP server span
//! middleware the capture middleware relies on.

pub mod exporter;
pub mod http_tracing;
pub mod logging;
pub mod tracing;

pub use exporter::new_exporter;
pub use http_tracing::trace_http_requests;
pub use logging::{init_logging, log_config_info};
pub use self::tracing::{base_sampler, init_tracing, provider_builder, shutdown_tracing};
