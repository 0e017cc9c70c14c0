//! Ratio dependent trace id generation.
//!
//! Trace ids carry their classification in their first three bytes. A debug
//! session forces the debug prefix on every new trace; otherwise the lower
//! half of the random id decides whether the trace is picked for
//! documentation, so the documentation ratio holds over any large sample.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use opentelemetry::{SpanId, TraceId};
use opentelemetry_sdk::trace::IdGenerator;
use rand::{rngs::SmallRng, RngCore, SeedableRng};

use crate::constants::{MULTIPLAYER_TRACE_DEBUG_PREFIX_BYTES, MULTIPLAYER_TRACE_DOC_PREFIX_BYTES};

#[derive(Debug)]
struct GeneratorState {
    rng: SmallRng,
    debug_session: Option<String>,
}

#[derive(Debug)]
struct Inner {
    /// `ratio * 2^63`, compared against the top 63 bits of the lower half.
    trace_id_upper_bound: u64,
    state: Mutex<GeneratorState>,
}

/// [`IdGenerator`] that stamps classification prefixes into trace ids.
///
/// Cloning is cheap and clones share state, so the application can hand one
/// clone to the tracer provider and keep another to toggle debug sessions.
#[derive(Debug, Clone)]
pub struct RatioDependentIdGenerator {
    inner: Arc<Inner>,
}

impl RatioDependentIdGenerator {
    /// Create a generator seeded from the operating system's secure RNG.
    ///
    /// `doc_traces_ratio` is clamped to `[0, 1]`.
    pub fn new(doc_traces_ratio: f64) -> Self {
        Self::from_rng(doc_traces_ratio, SmallRng::from_entropy())
    }

    /// Create a generator with a fixed seed, for reproducible sequences.
    pub fn with_seed(doc_traces_ratio: f64, seed: u64) -> Self {
        Self::from_rng(doc_traces_ratio, SmallRng::seed_from_u64(seed))
    }

    fn from_rng(doc_traces_ratio: f64, rng: SmallRng) -> Self {
        let ratio = if doc_traces_ratio.is_nan() { 0.0 } else { doc_traces_ratio.clamp(0.0, 1.0) };
        Self {
            inner: Arc::new(Inner {
                trace_id_upper_bound: (ratio * (1u64 << 63) as f64) as u64,
                state: Mutex::new(GeneratorState { rng, debug_session: None }),
            }),
        }
    }

    /// Start a debug session; every trace generated from now on is a debug trace.
    ///
    /// An empty id ends the session.
    pub fn set_debug_session(&self, debug_session_id: impl Into<String>) {
        let id = debug_session_id.into();
        let mut state = self.lock();
        state.debug_session = if id.is_empty() { None } else { Some(id) };
    }

    pub fn clear_debug_session(&self) {
        self.lock().debug_session = None;
    }

    /// The active debug session id, if any.
    pub fn debug_session(&self) -> Option<String> {
        self.lock().debug_session.clone()
    }

    /// Generate a classified trace id together with its root span id.
    pub fn generate_ids(&self) -> (TraceId, SpanId) {
        let mut state = self.lock();
        let trace_id = self.draw_trace_id(&mut state);
        let span_id = draw_span_id(&mut state.rng);
        (trace_id, span_id)
    }

    /// Generate a span id for an existing trace.
    pub fn generate_span_id(&self, _trace_id: TraceId) -> SpanId {
        draw_span_id(&mut self.lock().rng)
    }

    fn draw_trace_id(&self, state: &mut GeneratorState) -> TraceId {
        let mut bytes = [0u8; 16];
        loop {
            state.rng.fill_bytes(&mut bytes);
            if bytes != [0u8; 16] {
                break;
            }
        }

        let prefix = if state.debug_session.is_some() {
            Some(&MULTIPLAYER_TRACE_DEBUG_PREFIX_BYTES)
        } else {
            let mut lower = [0u8; 8];
            lower.copy_from_slice(&bytes[8..16]);
            let value = u64::from_be_bytes(lower) >> 1;
            (value < self.inner.trace_id_upper_bound).then_some(&MULTIPLAYER_TRACE_DOC_PREFIX_BYTES)
        };
        if let Some(prefix) = prefix {
            bytes[..prefix.len()].copy_from_slice(prefix);
        }

        TraceId::from_bytes(bytes)
    }

    fn lock(&self) -> MutexGuard<'_, GeneratorState> {
        // The state stays consistent even if a holder panicked mid-draw.
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn draw_span_id(rng: &mut SmallRng) -> SpanId {
    let mut bytes = [0u8; 8];
    loop {
        rng.fill_bytes(&mut bytes);
        if bytes != [0u8; 8] {
            return SpanId::from_bytes(bytes);
        }
    }
}

impl IdGenerator for RatioDependentIdGenerator {
    fn new_trace_id(&self) -> TraceId {
        let mut state = self.lock();
        self.draw_trace_id(&mut state)
    }

    fn new_span_id(&self) -> SpanId {
        draw_span_id(&mut self.lock().rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::TraceClassification;

    const SAMPLES: usize = 20_000;

    fn doc_fraction(generator: &RatioDependentIdGenerator) -> f64 {
        let docs = (0..SAMPLES)
            .filter(|_| {
                let (trace_id, _) = generator.generate_ids();
                TraceClassification::from_trace_id(trace_id) == TraceClassification::Doc
            })
            .count();
        docs as f64 / SAMPLES as f64
    }

    #[test]
    fn test_ids_are_never_invalid() {
        let generator = RatioDependentIdGenerator::with_seed(0.5, 7);
        for _ in 0..1_000 {
            let (trace_id, span_id) = generator.generate_ids();
            assert_ne!(trace_id, TraceId::INVALID);
            assert_ne!(span_id, SpanId::INVALID);
            assert_ne!(generator.generate_span_id(trace_id), SpanId::INVALID);
        }
    }

    #[test]
    fn test_ratio_zero_never_classifies() {
        let generator = RatioDependentIdGenerator::with_seed(0.0, 1);
        assert_eq!(doc_fraction(&generator), 0.0);
    }

    #[test]
    fn test_ratio_one_always_doc() {
        let generator = RatioDependentIdGenerator::with_seed(1.0, 2);
        assert_eq!(doc_fraction(&generator), 1.0);
    }

    #[test]
    fn test_ratio_converges() {
        let generator = RatioDependentIdGenerator::with_seed(0.25, 3);
        let fraction = doc_fraction(&generator);
        assert!((fraction - 0.25).abs() < 0.02, "doc fraction {fraction}");
    }

    #[test]
    fn test_out_of_range_ratio_is_clamped() {
        assert_eq!(doc_fraction(&RatioDependentIdGenerator::with_seed(3.0, 4)), 1.0);
        assert_eq!(doc_fraction(&RatioDependentIdGenerator::with_seed(-1.0, 4)), 0.0);
        assert_eq!(doc_fraction(&RatioDependentIdGenerator::with_seed(f64::NAN, 4)), 0.0);
    }

    #[test]
    fn test_debug_session_overrides_ratio() {
        let generator = RatioDependentIdGenerator::with_seed(1.0, 5);
        generator.set_debug_session("session-42");
        assert_eq!(generator.debug_session().as_deref(), Some("session-42"));

        for _ in 0..1_000 {
            let (trace_id, _) = generator.generate_ids();
            assert_eq!(TraceClassification::from_trace_id(trace_id), TraceClassification::Debug);
            assert_eq!(
                TraceClassification::from_trace_id(generator.new_trace_id()),
                TraceClassification::Debug
            );
        }

        generator.clear_debug_session();
        let (trace_id, _) = generator.generate_ids();
        assert_eq!(TraceClassification::from_trace_id(trace_id), TraceClassification::Doc);
    }

    #[test]
    fn test_empty_session_id_ends_session() {
        let generator = RatioDependentIdGenerator::with_seed(0.0, 6);
        generator.set_debug_session("abc");
        generator.set_debug_session("");
        assert!(generator.debug_session().is_none());
        let (trace_id, _) = generator.generate_ids();
        assert_eq!(TraceClassification::from_trace_id(trace_id), TraceClassification::None);
    }

    #[test]
    fn test_clones_share_state() {
        let generator = RatioDependentIdGenerator::with_seed(0.0, 8);
        let handle = generator.clone();
        handle.set_debug_session("shared");
        assert_eq!(
            TraceClassification::from_trace_id(generator.new_trace_id()),
            TraceClassification::Debug
        );
    }

    #[test]
    fn test_seeded_generators_are_reproducible() {
        let a = RatioDependentIdGenerator::with_seed(0.5, 99);
        let b = RatioDependentIdGenerator::with_seed(0.5, 99);
        for _ in 0..10 {
            assert_eq!(a.generate_ids(), b.generate_ids());
        }
    }

    #[test]
    fn test_prefix_keeps_random_tail() {
        let generator = RatioDependentIdGenerator::with_seed(0.0, 10);
        generator.set_debug_session("tail");
        let first = generator.new_trace_id().to_bytes();
        let second = generator.new_trace_id().to_bytes();
        assert_eq!(&first[..3], &MULTIPLAYER_TRACE_DEBUG_PREFIX_BYTES);
        assert_ne!(first[3..], second[3..]);
    }

    #[test]
    fn test_concurrent_generation() {
        let generator = RatioDependentIdGenerator::with_seed(0.5, 11);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let generator = generator.clone();
                std::thread::spawn(move || {
                    (0..500).map(|_| generator.generate_ids().0).collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids = std::collections::HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(ids.insert(id), "duplicate trace id {id}");
            }
        }
    }
}
