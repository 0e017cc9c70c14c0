//! OTLP/HTTP span exporter pointed at the Multiplayer collector.

use std::collections::HashMap;

use opentelemetry_otlp::{Protocol, SpanExporter, WithExportConfig, WithHttpConfig};

use crate::{Error, Result};

/// Build an OTLP/HTTP trace exporter authenticated with `api_key`.
///
/// The key is sent verbatim in the `Authorization` header. The exporter uses
/// the blocking HTTP client, so call this outside of an async runtime.
pub fn new_exporter(api_key: &str, endpoint: &str) -> Result<SpanExporter> {
    if api_key.trim().is_empty() {
        return Err(Error::config("Multiplayer API key must not be empty"));
    }

    let headers = HashMap::from([("Authorization".to_string(), api_key.to_string())]);

    let exporter = SpanExporter::builder()
        .with_http()
        .with_protocol(Protocol::HttpBinary)
        .with_endpoint(endpoint)
        .with_headers(headers)
        .build()?;

    Ok(exporter)
}
