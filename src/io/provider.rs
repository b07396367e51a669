//! Buffer provider collaborator
//!
//! The scan façade asks a [`BufferProvider`] for the audio around the host's
//! current position instead of taking samples directly. [`InMemoryBuffer`] is
//! the reference implementation used by tests and by hosts that already hold
//! the decoded clip in memory.

use crate::error::AnalysisError;

/// Parameters of a window request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowRequest {
    /// Requested window length in frames
    pub size: usize,

    /// Maximum distance in frames the window may extend from the position (0 = unbounded)
    pub looking_range: usize,

    /// Downmix to a single channel
    pub mono: bool,

    /// End the window at the position instead of centering it
    pub look_backward: bool,
}

impl WindowRequest {
    /// Centered mono request, the shape every scan uses
    pub fn centered_mono(size: usize, looking_range: usize) -> Self {
        Self {
            size,
            looking_range,
            mono: true,
            look_backward: false,
        }
    }
}

/// Source of sample windows around a host-tracked position
pub trait BufferProvider {
    /// Return the samples for `request`
    ///
    /// Mono requests yield one sample per frame; otherwise samples are
    /// interleaved with [`BufferProvider::channels`] channels. The result may be
    /// shorter than requested near the buffer edges.
    fn window(&self, request: WindowRequest) -> Result<Vec<f32>, AnalysisError>;

    /// Sample rate of the owning audio in Hz
    fn sample_rate(&self) -> u32;

    /// Channel count of the owning audio
    fn channels(&self) -> u16;
}

/// Interleaved clip held in memory with a movable position
#[derive(Debug, Clone)]
pub struct InMemoryBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
    position: usize,
}

impl InMemoryBuffer {
    /// Wrap interleaved samples; the position starts at frame 0
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels: channels.max(1),
            position: 0,
        }
    }

    /// Total number of frames
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// Current position in frames
    pub fn position(&self) -> usize {
        self.position
    }

    /// Move the position (clamped to the clip)
    pub fn set_position(&mut self, frame: usize) {
        self.position = frame.min(self.frames());
    }

    /// Frame range `[start, end)` served for `request`
    fn frame_range(&self, request: &WindowRequest) -> (usize, usize) {
        let total = self.frames();
        let position = self.position.min(total);

        let (lo, hi) = if request.looking_range > 0 {
            (
                position.saturating_sub(request.looking_range),
                (position + request.looking_range).min(total),
            )
        } else {
            (0, total)
        };

        let desired_start = if request.look_backward {
            position.saturating_sub(request.size)
        } else {
            position.saturating_sub(request.size / 2)
        };

        let mut start = desired_start.clamp(lo, hi);
        let end = (start + request.size).min(hi);
        if end - start < request.size {
            // Slide back toward the start when the far edge clipped the window.
            start = end.saturating_sub(request.size).max(lo);
        }
        (start, end)
    }
}

impl BufferProvider for InMemoryBuffer {
    fn window(&self, request: WindowRequest) -> Result<Vec<f32>, AnalysisError> {
        let (start, end) = self.frame_range(&request);
        let channels = self.channels as usize;
        let slice = &self.samples[start * channels..end * channels];

        log::debug!(
            "Serving window [{}, {}) of {} frames (mono={}, backward={})",
            start,
            end,
            self.frames(),
            request.mono,
            request.look_backward
        );

        if request.mono && channels > 1 {
            let scale = 1.0 / channels as f32;
            Ok(slice
                .chunks_exact(channels)
                .map(|frame| frame.iter().sum::<f32>() * scale)
                .collect())
        } else {
            Ok(slice.to_vec())
        }
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> u16 {
        self.channels
    }
}
