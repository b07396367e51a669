//! Analysis windowing: Hann window, FFT size selection, framing
//!
//! # Example
//!
//! ```
//! use groove_scan::preprocessing::window::{analysis_fft_size, frame_count};
//!
//! assert_eq!(analysis_fft_size(44100), 8192);
//! assert_eq!(frame_count(8192 + 4 * 2048, 8192, 2048), 5);
//! ```

use rustfft::num_complex::Complex;
use std::f64::consts::PI;

/// Periodic Hann window of length `n`
pub fn hann_window(n: usize) -> Vec<f64> {
    if n <= 1 {
        return vec![1.0; n];
    }
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / n as f64).cos())
        .collect()
}

/// FFT size used for tempo and key analysis at `sample_rate`
///
/// 4096 up to 32 kHz, 8192 up to 48 kHz, 16384 above.
pub fn analysis_fft_size(sample_rate: u32) -> usize {
    let size: usize = if sample_rate <= 32_000 {
        4096
    } else if sample_rate <= 48_000 {
        8192
    } else {
        16384
    };
    size.next_power_of_two()
}

/// Number of full frames of `fft_size` at `hop_size` (at least 1)
pub fn frame_count(len: usize, fft_size: usize, hop_size: usize) -> usize {
    if len <= fft_size || hop_size == 0 {
        return 1;
    }
    1 + (len - fft_size) / hop_size
}

/// Copy frame `index` into `buffer` with the window applied
///
/// Samples past the end of `samples` are treated as zero, so a window shorter
/// than the FFT size becomes one zero-padded frame.
pub fn load_frame(
    samples: &[f64],
    window: &[f64],
    index: usize,
    hop_size: usize,
    buffer: &mut [Complex<f64>],
) {
    let start = index * hop_size;
    for (i, (slot, &w)) in buffer.iter_mut().zip(window.iter()).enumerate() {
        let sample = samples.get(start + i).copied().unwrap_or(0.0);
        *slot = Complex::new(sample * w, 0.0);
    }
}
