//! Period estimation (tempo)
//!
//! Convert a mono window to a BPM estimate:
//! - Spectral flux novelty curve
//! - FFT autocorrelation
//! - Lag search with parabolic refinement and octave disambiguation
//! - Search range resolution (auto-ranging)

pub mod autocorrelation;
pub mod bpm_range;
pub mod novelty;
pub mod tempo;

pub use autocorrelation::autocorrelation;
pub use bpm_range::{resolve_bpm_range, BpmRange};
pub use novelty::spectral_flux_novelty;
pub use tempo::estimate_tempo;

/// Onset strength over time, one value per analysis frame
#[derive(Debug, Clone, PartialEq)]
pub struct NoveltyCurve {
    /// Non-negative novelty values
    pub values: Vec<f64>,

    /// Frames per second (`sample_rate / hop_size`)
    pub frame_rate: f64,
}

impl NoveltyCurve {
    /// Number of frames
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if the curve has no frames
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Beat period in frames for `bpm`
    pub fn lag_for_bpm(&self, bpm: f64) -> f64 {
        self.frame_rate * 60.0 / bpm
    }
}
