//! # Trace Classification
//!
//! Identifier generation, classification and sampling. The three pieces share
//! one contract: the classification prefixes in [`crate::constants`].

pub mod classification;
pub mod id_generator;
pub mod sampler;

pub use classification::{
    is_debug_trace, is_doc_trace, is_multiplayer_trace, TraceClassification,
};
pub use id_generator::RatioDependentIdGenerator;
pub use sampler::TraceIdBasedSampler;
