//! # Error Handling
//!
//! Errors raised while bootstrapping the instrumentation (configuration,
//! exporter construction, logging setup). Request-time capture never returns
//! errors; it degrades to omitting an attribute instead.

/// Custom result type for multiplayer-otel operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for multiplayer-otel
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// OTLP exporter construction errors
    #[error("Exporter error: {0}")]
    Exporter(#[from] opentelemetry_otlp::ExporterBuildError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }
}
