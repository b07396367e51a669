//! HPCP-style chroma extraction
//!
//! Each analysis frame (hop = FFT size / 2) is Hann-windowed and transformed.
//! Every bin inside the analysis band contributes its power, whitened by
//! `sqrt(f)` to flatten the spectral tilt, at its first few harmonics: harmonic
//! `h` lands at MIDI pitch `69 + 12 * log2(f * h / 440)` and its energy (divided
//! by `h`) is split linearly between the two nearest pitch classes.
//!
//! Frames are independent, so fixed blocks of frames are spread over the rayon
//! pool. Each block sums into its own 12-bin vector and the block sums are
//! added in block order, so the result does not depend on scheduling.
//!
//! # Reference
//!
//! Gómez, E. (2006). Tonal Description of Music Audio Signals. PhD thesis,
//! Universitat Pompeu Fabra.
//!
//! # Example
//!
//! ```
//! use groove_scan::config::ChromaConfig;
//! use groove_scan::features::chroma::extract_chroma;
//! use groove_scan::fft::RustFftEngine;
//!
//! // One second of A4
//! let samples: Vec<f64> = (0..44100)
//!     .map(|i| (2.0 * std::f64::consts::PI * 440.0 * i as f64 / 44100.0).sin())
//!     .collect();
//! let chroma = extract_chroma(&samples, 44100, 8192, &ChromaConfig::default(), &RustFftEngine::new())?;
//! let strongest = (0..12).max_by(|&a, &b| chroma[a].total_cmp(&chroma[b])).unwrap();
//! assert_eq!(strongest, 9); // A
//! # Ok::<(), groove_scan::AnalysisError>(())
//! ```

use super::normalization::{l1_normalize, normalize_chroma};
use super::ChromaVector;
use crate::config::ChromaConfig;
use crate::error::AnalysisError;
use crate::fft::FftEngine;
use crate::preprocessing::window::{frame_count, hann_window, load_frame};
use rayon::prelude::*;
use rustfft::num_complex::Complex;

/// Pitch-class contributions of one FFT bin, harmonics and whitening folded in
#[derive(Debug, Clone)]
struct BinMapping {
    bin: usize,
    weights: Vec<(usize, f64)>,
}

/// Frames summed sequentially inside one parallel task
const FRAMES_PER_BLOCK: usize = 16;

/// Hop size used for chroma frames
pub fn chroma_hop_size(fft_size: usize) -> usize {
    (fft_size / 2).max(1)
}

/// Extract a normalized chroma vector from a mono window
///
/// Windows shorter than `fft_size` are zero-padded to a single frame.
///
/// # Returns
///
/// A 12-bin vector summing to 1, or all zeros when the band carries no energy.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for an empty window, a zero sample
/// rate, or an empty analysis band.
pub fn extract_chroma(
    samples: &[f64],
    sample_rate: u32,
    fft_size: usize,
    config: &ChromaConfig,
    engine: &dyn FftEngine,
) -> Result<ChromaVector, AnalysisError> {
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

    let hop_size = chroma_hop_size(fft_size);
    let n_frames = frame_count(samples.len(), fft_size, hop_size);
    let mappings = bin_mappings(sample_rate, fft_size, config)?;

    log::debug!(
        "Extracting chroma: {} samples at {} Hz, fft={}, hop={}, {} frames, {} bins in band",
        samples.len(),
        sample_rate,
        fft_size,
        hop_size,
        n_frames,
        mappings.len()
    );

    let window = hann_window(fft_size);

    let n_blocks = n_frames.div_ceil(FRAMES_PER_BLOCK);

    let block_sums = (0..n_blocks)
        .into_par_iter()
        .map(|block| -> Result<ChromaVector, AnalysisError> {
            let mut buffer = vec![Complex::new(0.0, 0.0); fft_size];
            let mut sum = [0.0f64; 12];
            let first = block * FRAMES_PER_BLOCK;
            let last = (first + FRAMES_PER_BLOCK).min(n_frames);

            for frame in first..last {
                load_frame(samples, &window, frame, hop_size, &mut buffer);
                engine.forward(&mut buffer)?;

                let mut local = [0.0f64; 12];
                for mapping in &mappings {
                    let power = buffer[mapping.bin].norm_sqr();
                    for &(pitch_class, weight) in &mapping.weights {
                        local[pitch_class] += power * weight;
                    }
                }
                if config.normalize_frames {
                    l1_normalize(&mut local);
                }

                for (total, value) in sum.iter_mut().zip(local.iter()) {
                    *total += value;
                }
            }
            Ok(sum)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut total = [0.0f64; 12];
    for block in &block_sums {
        for (sum, value) in total.iter_mut().zip(block.iter()) {
            *sum += value;
        }
    }

    let chroma = normalize_chroma(&total);

    log::debug!("Chroma: {:?}", chroma.map(|v| (v * 1000.0).round() / 1000.0));

    Ok(chroma)
}

/// Precompute the harmonic pitch-class weights of every in-band bin
fn bin_mappings(
    sample_rate: u32,
    fft_size: usize,
    config: &ChromaConfig,
) -> Result<Vec<BinMapping>, AnalysisError> {
    let nyquist = sample_rate as f64 / 2.0;
    let lower = config.min_frequency.max(0.0);
    let upper = config.max_frequency.min(nyquist - 1.0);
    if upper <= lower || fft_size < 2 {
        return Err(AnalysisError::InvalidInput(format!(
            "Empty chroma band [{:.1}, {:.1}] Hz at {} Hz",
            lower, upper, sample_rate
        )));
    }

    let bin_hz = sample_rate as f64 / fft_size as f64;
    let first_bin = ((lower / bin_hz).ceil() as usize).max(1);
    let last_bin = ((upper / bin_hz).floor() as usize).min(fft_size / 2);

    let mappings = (first_bin..=last_bin)
        .map(|bin| {
            let freq = bin as f64 * bin_hz;
            let whitening = freq.sqrt();
            let mut weights = Vec::with_capacity(2 * config.harmonics);

            for h in 1..=config.harmonics {
                let harmonic_freq = freq * h as f64;
                if harmonic_freq > upper {
                    break;
                }
                let midi = 69.0 + 12.0 * (harmonic_freq / config.reference_frequency).log2();
                let pitch = midi.rem_euclid(12.0);
                let lower_class = pitch.floor();
                let frac = pitch - lower_class;
                let scale = whitening / h as f64;

                let lo = (lower_class as usize) % 12;
                let hi = (lo + 1) % 12;
                weights.push((lo, scale * (1.0 - frac)));
                weights.push((hi, scale * frac));
            }

            BinMapping { bin, weights }
        })
        .collect();

    Ok(mappings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fft::RustFftEngine;
    use std::f64::consts::PI;

    fn tones(freqs: &[f64], sample_rate: u32, seconds: f64) -> Vec<f64> {
        let len = (sample_rate as f64 * seconds) as usize;
        (0..len)
            .map(|i| {
                let t = i as f64 / sample_rate as f64;
                freqs.iter().map(|f| (2.0 * PI * f * t).sin()).sum::<f64>() / freqs.len() as f64
            })
            .collect()
    }

    fn chroma_of(samples: &[f64]) -> ChromaVector {
        extract_chroma(samples, 44100, 8192, &ChromaConfig::default(), &RustFftEngine::new())
            .unwrap()
    }

    #[test]
    fn test_chroma_sums_to_one() {
        let chroma = chroma_of(&tones(&[261.63, 329.63], 44100, 1.0));
        assert!((chroma.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(chroma.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_chroma_silence_is_zero() {
        let chroma = chroma_of(&vec![0.0; 20000]);
        assert_eq!(chroma, [0.0; 12]);
    }

    #[test]
    fn test_chroma_triad_pitch_classes_dominate() {
        let chroma = chroma_of(&tones(&[261.63, 329.63, 392.0], 44100, 2.0));
        let triad = chroma[0] + chroma[4] + chroma[7];
        assert!(triad > 0.5, "C/E/G share {:.3}, chroma {:?}", triad, chroma);
        assert!(chroma[0] > chroma[1] && chroma[4] > chroma[5] && chroma[7] > chroma[6]);
    }

    #[test]
    fn test_chroma_independent_of_thread_count() {
        // 2 s at hop 4096 spans several frame blocks
        let samples = tones(&[220.0, 277.18, 329.63, 415.3], 44100, 2.0);
        let run = |threads: usize| {
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .unwrap()
                .install(|| chroma_of(&samples))
        };
        let single = run(1);
        assert_eq!(run(4), single);
        assert_eq!(run(7), single);
    }

    #[test]
    fn test_chroma_short_window_zero_padded() {
        let chroma = chroma_of(&tones(&[440.0], 44100, 0.05));
        assert!((chroma.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_bin_mapping_respects_band() {
        let config = ChromaConfig::default();
        let mappings = bin_mappings(44100, 8192, &config).unwrap();
        let bin_hz = 44100.0 / 8192.0;
        assert!(mappings.iter().all(|m| {
            let f = m.bin as f64 * bin_hz;
            (50.0..=5000.0).contains(&f)
        }));
        // Bins near the top of the band keep only their fundamental.
        let top = mappings.last().unwrap();
        assert_eq!(top.weights.len(), 2);

        let narrow = ChromaConfig {
            max_frequency: 40.0,
            ..ChromaConfig::default()
        };
        assert!(bin_mappings(44100, 8192, &narrow).is_err());
    }

    #[test]
    fn test_a440_maps_to_pitch_class_a() {
        let config = ChromaConfig {
            harmonics: 1,
            ..ChromaConfig::default()
        };
        // 44 Hz bins, so bin 10 sits exactly on 440 Hz.
        let mappings = bin_mappings(11264, 256, &config).unwrap();
        let a = mappings.iter().find(|m| m.bin == 10).unwrap();
        let total: f64 = a.weights.iter().map(|w| w.1).sum();
        let a_weight: f64 = a.weights.iter().filter(|w| w.0 == 9).map(|w| w.1).sum();
        assert!((a_weight / total - 1.0).abs() < 1e-9);
    }
}
