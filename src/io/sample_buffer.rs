//! Borrowed sample windows

use crate::error::AnalysisError;

/// A window of audio handed to the analysis pipeline
///
/// Samples are interleaved when `channels > 1`. The window borrows the
/// caller's buffer for the duration of a scan and is never mutated.
#[derive(Debug, Clone, Copy)]
pub struct SampleWindow<'a> {
    samples: &'a [f32],
    sample_rate: u32,
    channels: u16,
}

impl<'a> SampleWindow<'a> {
    /// Create a window over interleaved samples
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` if `sample_rate` or `channels` is zero.
    pub fn new(samples: &'a [f32], sample_rate: u32, channels: u16) -> Result<Self, AnalysisError> {
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidInput(
                "Invalid sample rate: 0".to_string(),
            ));
        }
        if channels == 0 {
            return Err(AnalysisError::InvalidInput(
                "Invalid channel count: 0".to_string(),
            ));
        }
        Ok(Self {
            samples,
            sample_rate,
            channels,
        })
    }

    /// Create a mono window
    pub fn mono(samples: &'a [f32], sample_rate: u32) -> Result<Self, AnalysisError> {
        Self::new(samples, sample_rate, 1)
    }

    /// Interleaved samples
    pub fn samples(&self) -> &'a [f32] {
        self.samples
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of interleaved channels
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Number of whole frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// Duration of the window in seconds
    pub fn duration_seconds(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    /// True if the window holds no complete frame
    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }
}
