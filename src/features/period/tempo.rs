//! Tempo estimation from a novelty curve
//!
//! # Algorithm
//!
//! 1. Normalize the novelty curve to zero mean / unit variance
//! 2. Compute its autocorrelation (see [`super::autocorrelation`])
//! 3. Convert the BPM range to a lag range:
//!    `min_lag = round(fr * 60 / max_bpm)`, `max_lag = round(fr * 60 / min_bpm)`
//! 4. Take the strongest lag in range and refine it with parabolic interpolation
//! 5. `BPM = 60 * fr / lag`
//! 6. Check half and double tempo; switch when the alternative's ACF peak is
//!    clearly stronger, or about as strong and slower
//! 7. Round to 0.1 BPM
//!
//! # Example
//!
//! ```
//! use groove_scan::config::TempoConfig;
//! use groove_scan::features::period::{estimate_tempo, BpmRange, NoveltyCurve};
//! use groove_scan::fft::RustFftEngine;
//!
//! // Impulse every 10 frames at 20 frames/s = 120 BPM
//! let values: Vec<f64> = (0..200).map(|i| if i % 10 == 0 { 1.0 } else { 0.0 }).collect();
//! let novelty = NoveltyCurve { values, frame_rate: 20.0 };
//! let estimate = estimate_tempo(
//!     &novelty,
//!     BpmRange::new(80.0, 160.0),
//!     &TempoConfig::default(),
//!     &RustFftEngine::new(),
//! )?
//! .expect("periodic novelty yields a tempo");
//! assert!((estimate.bpm - 120.0).abs() < 1.0);
//! # Ok::<(), groove_scan::AnalysisError>(())
//! ```

use super::autocorrelation::{autocorrelation, peak_lag};
use super::{BpmRange, NoveltyCurve};
use crate::analysis::result::TempoEstimate;
use crate::config::TempoConfig;
use crate::error::AnalysisError;
use crate::fft::FftEngine;

/// Smallest standard deviation treated as a non-degenerate novelty curve
const MIN_STD: f64 = 1e-12;

/// Smallest parabola curvature used for interpolation
const MIN_CURVATURE: f64 = 1e-12;

/// Estimate the tempo of a novelty curve within `range`
///
/// Returns `Ok(None)` when no estimate is possible: the curve is shorter than
/// `config.min_novelty_len`, has no variance, or the lag range is empty.
pub fn estimate_tempo(
    novelty: &NoveltyCurve,
    range: BpmRange,
    config: &TempoConfig,
    engine: &dyn FftEngine,
) -> Result<Option<TempoEstimate>, AnalysisError> {
    log::debug!(
        "Estimating tempo: {} novelty values at {:.2} frames/s, range=[{:.1}, {:.1}]",
        novelty.values.len(),
        novelty.frame_rate,
        range.min_bpm,
        range.max_bpm
    );

    if novelty.values.len() < config.min_novelty_len {
        log::warn!(
            "Novelty curve too short for tempo estimation: {} < {}",
            novelty.values.len(),
            config.min_novelty_len
        );
        return Ok(None);
    }
    if novelty.frame_rate <= 0.0 || range.min_bpm <= 0.0 {
        return Err(AnalysisError::InvalidInput(format!(
            "Invalid tempo search: frame_rate={:.3}, range=[{:.1}, {:.1}]",
            novelty.frame_rate, range.min_bpm, range.max_bpm
        )));
    }

    let normalized = match z_normalize(&novelty.values) {
        Some(values) => values,
        None => {
            log::warn!("Novelty curve has no variance, no tempo estimate");
            return Ok(None);
        }
    };

    let acf = autocorrelation(&normalized, engine)?;
    let lags = match LagRange::from_bpm_range(range, novelty.frame_rate, acf.len()) {
        Some(lags) => lags,
        None => {
            log::warn!(
                "Empty lag range for [{:.1}, {:.1}] BPM over {} frames",
                range.min_bpm,
                range.max_bpm,
                acf.len()
            );
            return Ok(None);
        }
    };

    let lag = match peak_lag(&acf, lags.min, lags.max) {
        Some(lag) => lag,
        None => return Ok(None),
    };
    let refined = refine_peak_lag(&acf, lag, lags.min, lags.max);
    let raw_bpm = 60.0 * novelty.frame_rate / refined;

    let (bpm, strength) =
        disambiguate_octave(&acf, raw_bpm, novelty.frame_rate, range, lags, config);
    let rounded = (bpm * 10.0).round() / 10.0;

    if !rounded.is_finite() || rounded <= 0.0 {
        return Err(AnalysisError::NumericalError(format!(
            "Tempo estimate is not a positive finite value: {}",
            rounded
        )));
    }

    log::debug!(
        "Tempo estimate: {:.1} BPM (peak lag {} -> {:.3}, strength {:.3})",
        rounded,
        lag,
        refined,
        strength
    );

    Ok(Some(TempoEstimate {
        bpm: rounded,
        confidence: strength.clamp(0.0, 1.0),
        lag: 60.0 * novelty.frame_rate / bpm,
    }))
}

/// Inclusive lag range in novelty frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LagRange {
    /// Shortest lag (fastest tempo)
    pub min: usize,
    /// Longest lag (slowest tempo)
    pub max: usize,
}

impl LagRange {
    /// Lags covering `range` at `frame_rate`, clamped to `[1, acf_len - 1]`
    pub fn from_bpm_range(range: BpmRange, frame_rate: f64, acf_len: usize) -> Option<Self> {
        if acf_len < 2 {
            return None;
        }
        let min = ((frame_rate * 60.0 / range.max_bpm).round() as usize).max(1);
        let max = ((frame_rate * 60.0 / range.min_bpm).round() as usize).min(acf_len - 1);
        if min > max {
            return None;
        }
        Some(Self { min, max })
    }
}

/// Zero mean, unit variance copy of `values`; `None` if the variance vanishes
pub fn z_normalize(values: &[f64]) -> Option<Vec<f64>> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    let std = variance.sqrt();
    if !std.is_finite() || std < MIN_STD {
        return None;
    }
    Some(values.iter().map(|v| (v - mean) / std).collect())
}

/// Refine an integer ACF peak with a parabola through its two neighbours
///
/// Peaks on the edge of `[min_lag, max_lag]` and flat neighbourhoods are
/// returned unchanged. The refined lag is clamped back into the range.
pub fn refine_peak_lag(acf: &[f64], lag: usize, min_lag: usize, max_lag: usize) -> f64 {
    if lag <= min_lag || lag >= max_lag || lag + 1 >= acf.len() {
        return lag as f64;
    }
    let y1 = acf[lag - 1];
    let y2 = acf[lag];
    let y3 = acf[lag + 1];
    let denominator = y1 - 2.0 * y2 + y3;
    if denominator.abs() <= MIN_CURVATURE {
        return lag as f64;
    }
    let offset = 0.5 * (y1 - y3) / denominator;
    (lag as f64 + offset).clamp(min_lag as f64, max_lag as f64)
}

/// Strongest ACF value within one lag of a fractional lag, inside `lags`
fn peak_strength(acf: &[f64], lag: f64, lags: LagRange) -> f64 {
    let center = lag.round() as usize;
    let lo = center.saturating_sub(1).max(lags.min);
    let hi = (center + 1).min(lags.max);
    if lo > hi {
        return f64::NEG_INFINITY;
    }
    acf[lo..=hi]
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max)
}

/// Resolve half/double tempo ambiguity
///
/// Candidates at `bpm / 2` then `bpm * 2` are considered when they fall in
/// `range`. A candidate replaces the current choice when its peak strength is
/// more than `harmonic_tolerance` above it, or within the tolerance and slower.
fn disambiguate_octave(
    acf: &[f64],
    bpm: f64,
    frame_rate: f64,
    range: BpmRange,
    lags: LagRange,
    config: &TempoConfig,
) -> (f64, f64) {
    let tolerance = config.harmonic_tolerance;
    let mut best_bpm = bpm;
    let mut best_strength = peak_strength(acf, 60.0 * frame_rate / bpm, lags);

    for candidate in [bpm / 2.0, bpm * 2.0] {
        if !range.contains(candidate) {
            continue;
        }
        let strength = peak_strength(acf, 60.0 * frame_rate / candidate, lags);
        let margin = tolerance * best_strength.abs();
        let clearly_stronger = strength > best_strength + margin;
        let comparable_and_slower =
            (strength - best_strength).abs() <= margin && candidate < best_bpm;

        if clearly_stronger || comparable_and_slower {
            log::debug!(
                "Octave switch {:.2} -> {:.2} BPM (strength {:.3} vs {:.3})",
                best_bpm,
                candidate,
                strength,
                best_strength
            );
            best_bpm = candidate;
            best_strength = strength;
        }
    }

    (best_bpm, best_strength)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fft::RustFftEngine;

    fn pulses(len: usize, period: usize) -> Vec<f64> {
        (0..len).map(|i| if i % period == 0 { 1.0 } else { 0.0 }).collect()
    }

    fn estimate(values: Vec<f64>, frame_rate: f64, range: BpmRange) -> Option<TempoEstimate> {
        let novelty = NoveltyCurve { values, frame_rate };
        estimate_tempo(&novelty, range, &TempoConfig::default(), &RustFftEngine::new()).unwrap()
    }

    #[test]
    fn test_parabolic_refinement_symmetric_peak() {
        let acf = vec![1.0, 0.0, 0.2, 0.6, 1.0, 0.6, 0.2, 0.0];
        let refined = refine_peak_lag(&acf, 4, 1, 7);
        assert!((refined - 4.0).abs() < 0.01);
    }

    #[test]
    fn test_parabolic_refinement_leans_toward_larger_neighbour() {
        let acf = vec![1.0, 0.0, 0.2, 0.5, 1.0, 0.8, 0.2, 0.0];
        let refined = refine_peak_lag(&acf, 4, 1, 7);
        assert!(refined > 4.0 && refined < 4.5, "got {}", refined);
    }

    #[test]
    fn test_parabolic_refinement_skips_range_edges() {
        let acf = vec![1.0, 0.9, 0.3, 0.5, 0.2];
        assert_eq!(refine_peak_lag(&acf, 1, 1, 3), 1.0);
        assert_eq!(refine_peak_lag(&acf, 3, 1, 3), 3.0);
    }

    #[test]
    fn test_tempo_from_pulse_train() {
        // 10 frames per beat at 20 fps = 120 BPM
        let est = estimate(pulses(300, 10), 20.0, BpmRange::new(50.0, 200.0)).unwrap();
        assert!(
            (est.bpm - 120.0).abs() < 2.4 || (est.bpm - 60.0).abs() < 1.2,
            "got {}",
            est.bpm
        );
        assert!(est.confidence > 0.0 && est.confidence <= 1.0);
    }

    #[test]
    fn test_tempo_respects_range() {
        let est = estimate(pulses(300, 10), 20.0, BpmRange::new(90.0, 150.0)).unwrap();
        assert!((est.bpm - 120.0).abs() < 2.4, "got {}", est.bpm);
    }

    #[test]
    fn test_tempo_rounded_to_tenth() {
        let est = estimate(pulses(400, 13), 21.5, BpmRange::new(60.0, 150.0)).unwrap();
        let scaled = est.bpm * 10.0;
        assert!((scaled - scaled.round()).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_novelty_has_no_estimate() {
        assert!(estimate(vec![1.0; 5], 20.0, BpmRange::new(50.0, 200.0)).is_none());
        assert!(estimate(vec![0.0; 100], 20.0, BpmRange::new(50.0, 200.0)).is_none());
    }

    /// ACF with isolated peaks; at 60 frames/s lag 30 is 120 BPM
    fn octave_acf(peaks: &[(usize, f64)]) -> Vec<f64> {
        let mut acf = vec![0.0; 80];
        acf[0] = 1.0;
        for &(lag, value) in peaks {
            acf[lag] = value;
        }
        acf
    }

    fn resolve_octave(acf: &[f64]) -> f64 {
        let (bpm, _) = disambiguate_octave(
            acf,
            120.0,
            60.0,
            BpmRange::new(50.0, 250.0),
            LagRange { min: 10, max: 70 },
            &TempoConfig::default(),
        );
        bpm
    }

    #[test]
    fn test_octave_prefers_slower_near_tie() {
        // Half tempo 3% weaker
        assert_eq!(resolve_octave(&octave_acf(&[(30, 1.0), (60, 0.97)])), 60.0);
        // Half tempo 6% weaker
        assert_eq!(resolve_octave(&octave_acf(&[(30, 1.0), (60, 0.94)])), 120.0);
    }

    #[test]
    fn test_octave_faster_needs_clear_margin() {
        // Double tempo 3% stronger
        assert_eq!(resolve_octave(&octave_acf(&[(30, 1.0), (15, 1.03)])), 120.0);
        // Double tempo 6% stronger
        assert_eq!(resolve_octave(&octave_acf(&[(30, 1.0), (15, 1.06)])), 240.0);
    }

    #[test]
    fn test_octave_candidates_outside_range_ignored() {
        let acf = octave_acf(&[(30, 1.0), (15, 2.0), (60, 2.0)]);
        let (bpm, strength) = disambiguate_octave(
            &acf,
            120.0,
            60.0,
            BpmRange::new(100.0, 150.0),
            LagRange { min: 10, max: 70 },
            &TempoConfig::default(),
        );
        assert_eq!(bpm, 120.0);
        assert_eq!(strength, 1.0);
    }

    #[test]
    fn test_lag_range_conversion() {
        let lags = LagRange::from_bpm_range(BpmRange::new(50.0, 200.0), 20.0, 100).unwrap();
        assert_eq!(lags, LagRange { min: 6, max: 24 });

        let clipped = LagRange::from_bpm_range(BpmRange::new(50.0, 200.0), 20.0, 10).unwrap();
        assert_eq!(clipped.max, 9);

        assert!(LagRange::from_bpm_range(BpmRange::new(50.0, 200.0), 20.0, 4).is_none());
    }

    #[test]
    fn test_z_normalize() {
        let z = z_normalize(&[1.0, 2.0, 3.0]).unwrap();
        assert!(z.iter().sum::<f64>().abs() < 1e-12);
        assert!(z_normalize(&[2.0, 2.0]).is_none());
    }
}
