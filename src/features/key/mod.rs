//! Key detection
//!
//! Match a window's chroma vector against the 24 rotated Krumhansl-Kessler
//! profiles and report the best key with a margin-based confidence.

pub mod detector;
pub mod templates;

pub use detector::{detect_key, key_scores};
pub use templates::KeyTemplates;
