//! Chroma extraction
//!
//! Fold a window's spectrum into a 12-bin pitch-class energy vector:
//! - HPCP-style extraction with harmonic accumulation and whitening
//! - Clamping and L1 normalization

pub mod extractor;
pub mod normalization;

pub use extractor::extract_chroma;
pub use normalization::normalize_chroma;

/// Pitch-class energy, C through B
pub type ChromaVector = [f64; 12];
