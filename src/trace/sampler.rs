//! Sampler that never drops classified traces.

use opentelemetry::{
    trace::{
        Link, SamplingDecision, SamplingResult, SpanKind, TraceContextExt, TraceId, TraceState,
    },
    Context, KeyValue,
};
use opentelemetry_sdk::trace::ShouldSample;

use crate::trace::TraceClassification;

const SAMPLER_LABEL: &str = "MultiplayerTraceIdBasedSampler_";

/// Wraps a base sampler and forces `RecordAndSample` for documentation and
/// debug traces.
///
/// Classification is decided once, when the trace id is generated. Every
/// span of the trace asks its own sampling question, so the override has to
/// be applied to all of them for the payload attributes to reach the backend.
#[derive(Debug, Clone)]
pub struct TraceIdBasedSampler<S> {
    base: S,
    description: String,
}

impl<S: ShouldSample + Clone + 'static> TraceIdBasedSampler<S> {
    pub fn new(base: S) -> Self {
        let description = format!("{SAMPLER_LABEL}{base:?}");
        Self { base, description }
    }

    /// Fixed label followed by the base sampler's description.
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl<S: ShouldSample + Clone + 'static> ShouldSample for TraceIdBasedSampler<S> {
    fn should_sample(
        &self,
        parent_context: Option<&Context>,
        trace_id: TraceId,
        name: &str,
        span_kind: &SpanKind,
        attributes: &[KeyValue],
        links: &[Link],
    ) -> SamplingResult {
        if TraceClassification::from_trace_id(trace_id).is_classified() {
            let trace_state = parent_context
                .map(|cx| cx.span().span_context().trace_state().clone())
                .unwrap_or(TraceState::NONE);
            return SamplingResult {
                decision: SamplingDecision::RecordAndSample,
                attributes: Vec::new(),
                trace_state,
            };
        }

        self.base.should_sample(parent_context, trace_id, name, span_kind, attributes, links)
    }
}
