//! # Distributed Tracing
//!
//! Tracer provider wiring: the classification-aware id generator and sampler,
//! the service resource, and the OTLP exporter when an API key is configured.
//!
//! The exporter uses a blocking HTTP client and the batch processor runs on its
//! own thread, so [`init_tracing`] must be called before the Tokio runtime is
//! started.

use opentelemetry::global;
use opentelemetry_sdk::{
    propagation::TraceContextPropagator,
    trace::{Sampler, SdkTracerProvider, TracerProviderBuilder},
    Resource,
};
use tracing::{info, warn};

use crate::config::Config;
use crate::errors::Result;
use crate::observability::exporter::new_exporter;
use crate::trace::{RatioDependentIdGenerator, TraceIdBasedSampler};

/// Base sampler for unclassified traces: follow the parent, otherwise sample
/// root spans by trace id ratio.
pub fn base_sampler(sample_ratio: f64) -> Sampler {
    let root = if sample_ratio >= 1.0 {
        Sampler::AlwaysOn
    } else if sample_ratio <= 0.0 {
        Sampler::AlwaysOff
    } else {
        Sampler::TraceIdRatioBased(sample_ratio)
    };
    Sampler::ParentBased(Box::new(root))
}

/// Provider builder with the id generator, sampler and resource installed but
/// no span processor.
pub fn provider_builder(
    config: &Config,
    id_generator: RatioDependentIdGenerator,
) -> TracerProviderBuilder {
    let sampler = TraceIdBasedSampler::new(base_sampler(config.sample_ratio));
    let resource = Resource::builder().with_service_name(config.service_name.clone()).build();

    SdkTracerProvider::builder()
        .with_id_generator(id_generator)
        .with_sampler(sampler)
        .with_resource(resource)
}

/// Initialize OpenTelemetry tracing and register the global provider and W3C
/// trace context propagator.
///
/// Without an API key spans are still created, classified and sampled, but
/// not exported. Keep the returned provider and pass it to
/// [`shutdown_tracing`] before exit so batched spans are flushed.
pub fn init_tracing(
    config: &Config,
    id_generator: RatioDependentIdGenerator,
) -> Result<SdkTracerProvider> {
    let mut builder = provider_builder(config, id_generator);

    match config.api_key.as_deref() {
        Some(api_key) => {
            let exporter = new_exporter(api_key, &config.traces_endpoint)?;
            builder = builder.with_batch_exporter(exporter);
            info!(endpoint = %config.traces_endpoint, "OTLP trace export enabled");
        }
        None => warn!("No Multiplayer API key configured, spans will not be exported"),
    }

    let provider = builder.build();
    global::set_text_map_propagator(TraceContextPropagator::new());
    global::set_tracer_provider(provider.clone());

    info!(
        service_name = %config.service_name,
        doc_traces_ratio = config.doc_traces_ratio,
        sample_ratio = config.sample_ratio,
        "OpenTelemetry tracing initialized"
    );

    Ok(provider)
}

/// Flush and shut down the tracer provider.
pub fn shutdown_tracing(provider: SdkTracerProvider) {
    if let Err(e) = provider.shutdown() {
        warn!(error = %e, "Failed to shut down tracer provider cleanly");
    } else {
        info!("Tracer provider shut down");
    }
}
