//! Meter (beats per grouping) classification
//!
//! Detects how beats group into bars by looking at accent patterns on a beat
//! grid laid over the novelty curve.
//!
//! # Algorithm
//!
//! 1. Derive the beat period in novelty frames from a BPM hint (or an ACF peak
//!    search over the default tempo range when no hint is known)
//! 2. Measure each beat's strength as the mean novelty within ±period/4 of its
//!    grid tick
//! 3. For every candidate grouping K ∈ {2, 3, 4, 5, 6, 7, 8, 9, 12}, combine
//!    - periodicity: mean of `strength[i] * strength[i + K]`
//!    - phase contrast: strongest phase average minus the mean phase average
//!    - template fit: best circular Pearson correlation of the phase averages
//!      against an accent template for K
//! 4. Weight by bar coverage, apply small per-K priors, pick the best K
//! 5. Settle near-ties inside the duple {2, 4, 8, 12} and triple {3, 6, 12}
//!    chains
//! 6. Map K to a timing ratio in [0.125, 1.0]
//!
//! # Example
//!
//! ```
//! use groove_scan::config::AnalysisConfig;
//! use groove_scan::features::beat_tracking::time_signature::classify_meter;
//! use groove_scan::features::period::NoveltyCurve;
//! use groove_scan::fft::RustFftEngine;
//!
//! // 120 BPM at 20 frames/s: one beat every 10 frames, accent every 3rd beat
//! let values: Vec<f64> = (0..240)
//!     .map(|i| match (i % 10, (i / 10) % 3) {
//!         (0, 0) => 1.0,
//!         (0, _) => 0.5,
//!         _ => 0.0,
//!     })
//!     .collect();
//! let novelty = NoveltyCurve { values, frame_rate: 20.0 };
//! let meter = classify_meter(&novelty, Some(120.0), &AnalysisConfig::default(), &RustFftEngine::new())?;
//! assert_eq!(meter.best_k, 3);
//! # Ok::<(), groove_scan::AnalysisError>(())
//! ```

use crate::analysis::result::{MeterEstimate, MeterScores, METER_CANDIDATES};
use crate::config::{AnalysisConfig, MeterConfig};
use crate::error::AnalysisError;
use crate::features::period::autocorrelation::{autocorrelation, peak_lag};
use crate::features::period::tempo::{refine_peak_lag, z_normalize, LagRange};
use crate::features::period::{BpmRange, NoveltyCurve};
use crate::fft::FftEngine;

/// Minimum number of beats on the grid
const MIN_BEATS: usize = 4;

/// Numerical stability epsilon
const EPSILON: f64 = 1e-12;

/// Classify the meter of a novelty curve
///
/// # Arguments
///
/// * `novelty` - Novelty curve of the window
/// * `bpm_hint` - Known tempo; when `None` or outside the configured BPM clamp
///   the beat period comes from an ACF peak search over the default BPM range
/// * `config` - Analysis configuration
/// * `engine` - FFT engine for the fallback ACF
///
/// # Errors
///
/// Returns `AnalysisError::InsufficientData` when fewer than 4 beats fit on the
/// grid, no tempo can be found, or no candidate K is smaller than the beat count.
pub fn classify_meter(
    novelty: &NoveltyCurve,
    bpm_hint: Option<f64>,
    config: &AnalysisConfig,
    engine: &dyn FftEngine,
) -> Result<MeterEstimate, AnalysisError> {
    log::debug!(
        "Classifying meter: {} novelty values, bpm_hint={:?}",
        novelty.len(),
        bpm_hint
    );

    let tempo = &config.tempo;
    let usable_hint = bpm_hint.filter(|&b| {
        let usable = b.is_finite() && b >= tempo.clamp_min_bpm && b <= tempo.clamp_max_bpm;
        if !usable {
            log::debug!(
                "Ignoring BPM hint {} outside [{}, {}]",
                b,
                tempo.clamp_min_bpm,
                tempo.clamp_max_bpm
            );
        }
        usable
    });
    let beat_lag = match usable_hint {
        Some(bpm) => novelty.lag_for_bpm(bpm),
        None => fallback_beat_lag(novelty, config, engine)?,
    };
    if beat_lag.is_nan() || beat_lag < 1.0 {
        return Err(AnalysisError::InsufficientData(format!(
            "Beat period of {:.3} frames is shorter than one novelty frame",
            beat_lag
        )));
    }

    let strengths = beat_strengths(&novelty.values, beat_lag);
    if strengths.len() < MIN_BEATS {
        return Err(AnalysisError::InsufficientData(format!(
            "Only {} beats on the grid (lag {:.2} frames), need {}",
            strengths.len(),
            beat_lag,
            MIN_BEATS
        )));
    }

    let n_beats = strengths.len();
    let mut scores = MeterScores::default();
    for &k in METER_CANDIDATES.iter().filter(|&&k| (k as usize) < n_beats) {
        scores.set(k, score_grouping(&strengths, k as usize, &config.meter));
    }

    let (best_k, best_score) = scores.best().ok_or_else(|| {
        AnalysisError::InsufficientData(format!(
            "No meter candidate fits {} beats",
            n_beats
        ))
    })?;

    let resolved = resolve_harmonic_chains(best_k, &scores, config.meter.chain_tolerance);
    let normalized_timing = normalize_timing(resolved);

    log::debug!(
        "Meter: best K={} (score {:.4}), resolved K={}, timing {:.3}, {} beats",
        best_k,
        best_score,
        resolved,
        normalized_timing,
        n_beats
    );

    Ok(MeterEstimate {
        best_k: resolved,
        normalized_timing,
        scores,
    })
}

/// Beat period from the strongest ACF lag in the default tempo range
fn fallback_beat_lag(
    novelty: &NoveltyCurve,
    config: &AnalysisConfig,
    engine: &dyn FftEngine,
) -> Result<f64, AnalysisError> {
    let range = BpmRange::new(config.tempo.default_min_bpm, config.tempo.default_max_bpm);
    let no_tempo = || {
        AnalysisError::InsufficientData("No tempo found for the beat grid".to_string())
    };

    let normalized = z_normalize(&novelty.values).ok_or_else(no_tempo)?;
    let acf = autocorrelation(&normalized, engine)?;
    let lags = LagRange::from_bpm_range(range, novelty.frame_rate, acf.len()).ok_or_else(no_tempo)?;
    let lag = peak_lag(&acf, lags.min, lags.max).ok_or_else(no_tempo)?;

    Ok(refine_peak_lag(&acf, lag, lags.min, lags.max))
}

/// Mean novelty within ±`beat_lag / 4` of each beat tick
///
/// Ticks sit at `i * beat_lag` for every whole beat that fits in the curve.
/// Positions outside the curve count as zero. A period shorter than one frame
/// yields no beats.
pub fn beat_strengths(values: &[f64], beat_lag: f64) -> Vec<f64> {
    if values.is_empty() || !beat_lag.is_finite() || beat_lag < 1.0 {
        return Vec::new();
    }

    let n_beats = (values.len() as f64 / beat_lag).floor() as usize;
    let radius = (beat_lag / 4.0).round() as usize;
    let width = (2 * radius + 1) as f64;

    (0..n_beats)
        .map(|i| {
            let center = (i as f64 * beat_lag).round() as usize;
            let lo = center.saturating_sub(radius);
            let hi = (center + radius).min(values.len() - 1);
            values[lo..=hi].iter().sum::<f64>() / width
        })
        .collect()
}

/// Combined score for grouping beats in bars of `k`
fn score_grouping(strengths: &[f64], k: usize, config: &MeterConfig) -> f64 {
    let n = strengths.len();

    let periodicity = {
        let pairs = n - k;
        strengths[..pairs]
            .iter()
            .zip(strengths[k..].iter())
            .map(|(a, b)| a * b)
            .sum::<f64>()
            / pairs as f64
    };

    let bins = phase_averages(strengths, k);
    let bin_mean = bins.iter().sum::<f64>() / k as f64;
    let contrast = bins.iter().copied().fold(f64::NEG_INFINITY, f64::max) - bin_mean;

    let template = meter_template(k, config);
    let template_fit = circular_correlation(&bins, &template);

    let n_bars = (n / k) as f64;
    let coverage = 0.7 + 0.3 * (n_bars / 4.0).min(1.0);

    let mut score = (config.periodicity_weight * periodicity
        + config.contrast_weight * contrast
        + config.template_weight * template_fit)
        * coverage;

    if k == 2 {
        score *= config.duple_bias;
    } else if k == 4 {
        score *= config.quadruple_bias;
    }
    if k % 3 == 0 {
        score *= config.triple_bias;
    }

    log::trace!(
        "K={}: periodicity={:.4}, contrast={:.4}, template={:.4}, coverage={:.3}, score={:.4}",
        k,
        periodicity,
        contrast,
        template_fit,
        coverage,
        score
    );

    score
}

/// Average beat strength per phase `i mod k`
fn phase_averages(strengths: &[f64], k: usize) -> Vec<f64> {
    let mut sums = vec![0.0; k];
    let mut counts = vec![0usize; k];
    for (i, &s) in strengths.iter().enumerate() {
        sums[i % k] += s;
        counts[i % k] += 1;
    }
    sums.iter()
        .zip(counts.iter())
        .map(|(&sum, &count)| if count > 0 { sum / count as f64 } else { 0.0 })
        .collect()
}

/// Accent template for a bar of `k` beats
///
/// Downbeat at phase 0, a secondary accent at K/2 for multiples of 4 and at
/// K/3 and 2K/3 for multiples of 3.
fn meter_template(k: usize, config: &MeterConfig) -> Vec<f64> {
    let mut template = vec![config.template_weak; k];
    if k % 4 == 0 {
        template[k / 2] = config.template_half_bar;
    }
    if k % 3 == 0 {
        template[k / 3] = config.template_third_bar;
        template[2 * k / 3] = config.template_third_bar;
    }
    template[0] = config.template_downbeat;
    template
}

/// Best Pearson correlation of `values` against every rotation of `template`
fn circular_correlation(values: &[f64], template: &[f64]) -> f64 {
    let (x, t) = match (standardize(values), standardize(template)) {
        (Some(x), Some(t)) => (x, t),
        _ => return 0.0,
    };
    let k = x.len();

    (0..k)
        .map(|shift| {
            x.iter()
                .enumerate()
                .map(|(i, xi)| xi * t[(i + k - shift) % k])
                .sum::<f64>()
                / k as f64
        })
        .fold(f64::NEG_INFINITY, f64::max)
}

fn standardize(values: &[f64]) -> Option<Vec<f64>> {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let std = (values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n).sqrt();
    if std < EPSILON {
        return None;
    }
    Some(values.iter().map(|v| (v - mean) / std).collect())
}

/// Settle near-ties between harmonically related groupings
///
/// A duple winner (2, 4, 8) moves to the largest of {2, 4, 8, 12} within
/// `tolerance` of that chain's best score, and 2 yields to 4 whenever 4 is
/// within `tolerance` of it. A triple winner (3, 6, 12) moves to the smallest
/// of {3, 6, 12} within `tolerance` of that chain's best score.
pub fn resolve_harmonic_chains(best_k: u32, scores: &MeterScores, tolerance: f64) -> u32 {
    const DUPLE_CHAIN: [u32; 4] = [2, 4, 8, 12];
    const TRIPLE_CHAIN: [u32; 3] = [3, 6, 12];

    let near_max = |chain: &[u32]| -> Vec<u32> {
        let chain_max = chain
            .iter()
            .filter_map(|&k| scores.get(k))
            .fold(f64::NEG_INFINITY, f64::max);
        let floor = chain_max - tolerance * chain_max.abs();
        chain
            .iter()
            .copied()
            .filter(|&k| scores.get(k).map_or(false, |s| s >= floor))
            .collect()
    };

    match best_k {
        2 | 4 | 8 => {
            let mut k = near_max(&DUPLE_CHAIN).into_iter().max().unwrap_or(best_k);
            if k == 2 {
                if let (Some(s2), Some(s4)) = (scores.get(2), scores.get(4)) {
                    if s4 >= s2 - tolerance * s2.abs() {
                        k = 4;
                    }
                }
            }
            k
        }
        3 | 6 | 12 => near_max(&TRIPLE_CHAIN).into_iter().min().unwrap_or(best_k),
        _ => best_k,
    }
}

/// Map a grouping to a timing ratio: K/4 up to 4, K/8 up to 8, else K/12
pub fn normalize_timing(k: u32) -> f64 {
    let k = k as f64;
    let ratio = if k <= 4.0 {
        k / 4.0
    } else if k <= 8.0 {
        k / 8.0
    } else {
        k / 12.0
    };
    ratio.clamp(0.125, 1.0)
}
