//! Audio preprocessing
//!
//! Prepares a caller's window for analysis:
//! - Channel mixing (interleaved to mono)
//! - Hann windowing, FFT size selection and framing

pub mod channel_mixer;
pub mod window;

pub use channel_mixer::downmix;
pub use window::{analysis_fft_size, hann_window};
