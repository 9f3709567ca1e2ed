//! The map pipeline: graph construction → importance scoring → budget-aware
//! lossy projection → deterministic serialization.
//!
//! Each stage consumes the prior stage's output and is a pure,
//! order-independent-input / order-dependent-output pass. For a fixed fact
//! set and budget, the serialized artifact is byte-identical across runs.

pub mod builder;
pub mod pipeline;
pub mod project;
pub mod score;
pub mod serialize;
