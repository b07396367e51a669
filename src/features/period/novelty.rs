//! Spectral flux novelty curve
//!
//! Turns a mono window into an onset-strength curve with one value per
//! analysis frame:
//!
//! 1. Hann-window each frame (hop = FFT size / 4) and take the magnitude spectrum
//! 2. Sum the half-wave rectified bin-wise increase over the previous frame
//! 3. Compress with `log10(1 + x)`
//! 4. Subtract a centered moving average and clamp at zero, leaving only peaks
//!
//! Step 2 needs the previous frame's spectrum, so frames are processed in
//! order on a single thread.
//!
//! # Reference
//!
//! Dixon, S. (2006). Onset Detection Revisited. *Proceedings of the 9th
//! International Conference on Digital Audio Effects (DAFx-06)*.
//!
//! # Example
//!
//! ```
//! use groove_scan::features::period::novelty::spectral_flux_novelty;
//! use groove_scan::fft::RustFftEngine;
//!
//! let samples = vec![0.0f64; 44100];
//! let curve = spectral_flux_novelty(&samples, 44100, 8192, &RustFftEngine::new())?;
//! assert!((curve.frame_rate - 44100.0 / 2048.0).abs() < 1e-9);
//! # Ok::<(), groove_scan::AnalysisError>(())
//! ```

use super::NoveltyCurve;
use crate::error::AnalysisError;
use crate::fft::FftEngine;
use crate::preprocessing::window::{frame_count, hann_window, load_frame};
use rustfft::num_complex::Complex;

/// Hop size used for novelty frames
pub fn novelty_hop_size(fft_size: usize) -> usize {
    (fft_size / 4).max(1)
}

/// Compute the spectral flux novelty curve of a mono window
///
/// Windows shorter than `fft_size` are zero-padded to a single frame, which
/// yields a curve of length 1.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for an empty window, a zero sample
/// rate, or an FFT size the engine rejects.
pub fn spectral_flux_novelty(
    samples: &[f64],
    sample_rate: u32,
    fft_size: usize,
    engine: &dyn FftEngine,
) -> Result<NoveltyCurve, AnalysisError> {
    if samples.is_empty() {
        return Err(AnalysisError::InvalidInput(
            "Empty audio samples".to_string(),
        ));
    }
    if sample_rate == 0 {
        return Err(AnalysisError::InvalidInput(
            "Invalid sample rate: 0".to_string(),
        ));
    }

    let hop_size = novelty_hop_size(fft_size);
    let n_frames = frame_count(samples.len(), fft_size, hop_size);
    let n_bins = fft_size / 2 + 1;
    let frame_rate = sample_rate as f64 / hop_size as f64;

    log::debug!(
        "Computing spectral flux novelty: {} samples, fft={}, hop={}, {} frames",
        samples.len(),
        fft_size,
        hop_size,
        n_frames
    );

    let window = hann_window(fft_size);
    let mut buffer = vec![Complex::new(0.0, 0.0); fft_size];
    let mut previous = vec![0.0f64; n_bins];
    let mut current = vec![0.0f64; n_bins];
    let mut flux = Vec::with_capacity(n_frames);

    for frame in 0..n_frames {
        load_frame(samples, &window, frame, hop_size, &mut buffer);
        engine.forward(&mut buffer)?;

        for (mag, bin) in current.iter_mut().zip(buffer.iter()) {
            *mag = bin.norm();
        }

        if frame == 0 {
            flux.push(0.0);
        } else {
            let rise: f64 = current
                .iter()
                .zip(previous.iter())
                .map(|(&curr, &prev)| (curr - prev).max(0.0))
                .sum();
            flux.push(rise);
        }

        std::mem::swap(&mut previous, &mut current);
    }

    let values = compress_and_detrend(flux);

    log::debug!(
        "Spectral flux novelty: {} values, max={:.6}",
        values.len(),
        values.iter().copied().fold(0.0f64, f64::max)
    );

    Ok(NoveltyCurve { values, frame_rate })
}

/// `log10(1 + x)`, minus a centered moving average, clamped at zero
fn compress_and_detrend(flux: Vec<f64>) -> Vec<f64> {
    let compressed: Vec<f64> = flux.into_iter().map(|x| (1.0 + x).log10()).collect();
    let radius = (compressed.len() / 64).max(1);
    let baseline = moving_average(&compressed, radius);

    compressed
        .iter()
        .zip(baseline.iter())
        .map(|(&x, &b)| (x - b).max(0.0))
        .collect()
}

/// Centered moving average over `[i - radius, i + radius]`, clipped at the edges
fn moving_average(values: &[f64], radius: usize) -> Vec<f64> {
    let n = values.len();
    let mut prefix = Vec::with_capacity(n + 1);
    prefix.push(0.0);
    for &v in values {
        let last = prefix[prefix.len() - 1];
        prefix.push(last + v);
    }

    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(radius);
            let hi = (i + radius + 1).min(n);
            (prefix[hi] - prefix[lo]) / (hi - lo) as f64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fft::RustFftEngine;

    fn click_track(sample_rate: u32, bpm: f64, seconds: f64) -> Vec<f64> {
        let len = (sample_rate as f64 * seconds) as usize;
        let period = 60.0 * sample_rate as f64 / bpm;
        let mut samples = vec![0.0; len];
        let mut t = 0.1 * sample_rate as f64;
        while (t as usize) < len {
            let start = t as usize;
            for i in 0..400.min(len - start) {
                let decay = (-(i as f64) / 80.0).exp();
                samples[start + i] += decay * (i as f64 * 0.3).sin();
            }
            t += period;
        }
        samples
    }

    #[test]
    fn test_novelty_silence_is_flat_zero() {
        let samples = vec![0.0; 44100];
        let curve = spectral_flux_novelty(&samples, 44100, 8192, &RustFftEngine::new()).unwrap();
        assert_eq!(curve.values.len(), frame_count(44100, 8192, 2048));
        assert!(curve.values.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_novelty_short_window_single_frame() {
        let samples = vec![0.5; 1000];
        let curve = spectral_flux_novelty(&samples, 44100, 8192, &RustFftEngine::new()).unwrap();
        assert_eq!(curve.values.len(), 1);
    }

    #[test]
    fn test_novelty_non_negative_and_peaky() {
        let samples = click_track(44100, 120.0, 6.0);
        let curve = spectral_flux_novelty(&samples, 44100, 8192, &RustFftEngine::new()).unwrap();

        assert!(curve.values.iter().all(|&v| v >= 0.0));
        let max = curve.values.iter().copied().fold(0.0f64, f64::max);
        assert!(max > 0.0, "Clicks should produce novelty peaks");

        // Roughly one strong peak per beat: 6s at 120 BPM is 12 beats.
        let strong = curve
            .values
            .windows(3)
            .filter(|w| w[1] > w[0] && w[1] >= w[2] && w[1] > 0.3 * max)
            .count();
        assert!((6..=24).contains(&strong), "Got {} peaks", strong);
    }

    #[test]
    fn test_novelty_invalid_input() {
        let engine = RustFftEngine::new();
        assert!(spectral_flux_novelty(&[], 44100, 8192, &engine).is_err());
        assert!(spectral_flux_novelty(&[0.0; 10], 0, 8192, &engine).is_err());
        assert!(spectral_flux_novelty(&[0.0; 10], 44100, 1000, &engine).is_err());
    }

    #[test]
    fn test_moving_average_edges() {
        let avg = moving_average(&[3.0, 0.0, 0.0, 3.0], 1);
        assert!((avg[0] - 1.5).abs() < 1e-12);
        assert!((avg[1] - 1.0).abs() < 1e-12);
        assert!((avg[3] - 1.5).abs() < 1e-12);
    }
}
