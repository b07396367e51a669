//! Beat-level rhythm analysis
//!
//! Lays a beat grid over the novelty curve and infers how beats group:
//! - Beat strength sampling
//! - Meter classification with harmonic-chain tie-breaking

pub mod time_signature;

pub use time_signature::{classify_meter, normalize_timing};
