//! Feature extraction modules
//!
//! - Period estimation (novelty, autocorrelation, tempo)
//! - Beat tracking (meter classification)
//! - Chroma extraction
//! - Key detection

pub mod beat_tracking;
pub mod chroma;
pub mod key;
pub mod period;
