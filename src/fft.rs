//! FFT engine abstraction
//!
//! Everything above this module talks to the transform through [`FftEngine`],
//! so the pipeline does not care which implementation sits underneath. The
//! default engine wraps `rustfft` and caches one forward/inverse plan pair per
//! transform length.
//!
//! # Example
//!
//! ```
//! use groove_scan::fft::{FftEngine, RustFftEngine};
//! use rustfft::num_complex::Complex;
//!
//! let engine = RustFftEngine::new();
//! let mut buffer = vec![Complex::new(1.0, 0.0); 8];
//! engine.forward(&mut buffer)?;
//! assert!((buffer[0].re - 8.0).abs() < 1e-12);
//! # Ok::<(), groove_scan::AnalysisError>(())
//! ```

use crate::error::AnalysisError;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Forward/inverse complex transform over power-of-two buffers
///
/// The inverse is unnormalized: `inverse(forward(x)) == len * x`.
pub trait FftEngine: Send + Sync {
    /// In-place forward transform
    fn forward(&self, buffer: &mut [Complex<f64>]) -> Result<(), AnalysisError>;

    /// In-place inverse transform (unnormalized)
    fn inverse(&self, buffer: &mut [Complex<f64>]) -> Result<(), AnalysisError>;
}

#[derive(Clone)]
struct PlanPair {
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

/// [`FftEngine`] backed by `rustfft`
///
/// Plans are looked up under a read lock, so parallel callers that share the
/// engine only contend the first time a length is seen.
pub struct RustFftEngine {
    plans: RwLock<HashMap<usize, PlanPair>>,
}

impl RustFftEngine {
    /// Create an engine with an empty plan cache
    pub fn new() -> Self {
        Self {
            plans: RwLock::new(HashMap::new()),
        }
    }

    fn plans_for(&self, len: usize) -> Result<PlanPair, AnalysisError> {
        if len == 0 || !len.is_power_of_two() {
            return Err(AnalysisError::InvalidInput(format!(
                "FFT length must be a non-zero power of two, got {}",
                len
            )));
        }

        {
            let cache = self.plans.read().map_err(|_| {
                AnalysisError::ProcessingError("FFT plan cache lock poisoned".to_string())
            })?;
            if let Some(pair) = cache.get(&len) {
                return Ok(pair.clone());
            }
        }

        let mut cache = self.plans.write().map_err(|_| {
            AnalysisError::ProcessingError("FFT plan cache lock poisoned".to_string())
        })?;
        let pair = cache
            .entry(len)
            .or_insert_with(|| {
                log::debug!("Planning FFT of length {}", len);
                let mut planner = FftPlanner::new();
                PlanPair {
                    forward: planner.plan_fft_forward(len),
                    inverse: planner.plan_fft_inverse(len),
                }
            })
            .clone();
        Ok(pair)
    }
}

impl Default for RustFftEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FftEngine for RustFftEngine {
    fn forward(&self, buffer: &mut [Complex<f64>]) -> Result<(), AnalysisError> {
        let plans = self.plans_for(buffer.len())?;
        plans.forward.process(buffer);
        Ok(())
    }

    fn inverse(&self, buffer: &mut [Complex<f64>]) -> Result<(), AnalysisError> {
        let plans = self.plans_for(buffer.len())?;
        plans.inverse.process(buffer);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_inverse_scales_by_length() {
        let engine = RustFftEngine::new();
        let original: Vec<Complex<f64>> = (0..16)
            .map(|i| Complex::new((i as f64 * 0.3).sin(), 0.0))
            .collect();
        let mut buffer = original.clone();

        engine.forward(&mut buffer).unwrap();
        engine.inverse(&mut buffer).unwrap();

        for (a, b) in buffer.iter().zip(original.iter()) {
            assert!((a.re / 16.0 - b.re).abs() < 1e-9);
            assert!((a.im / 16.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_rejects_non_power_of_two() {
        let engine = RustFftEngine::new();
        let mut buffer = vec![Complex::new(0.0, 0.0); 12];
        assert!(matches!(
            engine.forward(&mut buffer),
            Err(AnalysisError::InvalidInput(_))
        ));

        let mut empty: Vec<Complex<f64>> = Vec::new();
        assert!(engine.inverse(&mut empty).is_err());
    }

    #[test]
    fn test_sine_peaks_at_its_bin() {
        let engine = RustFftEngine::new();
        let n = 64;
        let mut buffer: Vec<Complex<f64>> = (0..n)
            .map(|i| {
                let phase = 2.0 * std::f64::consts::PI * 5.0 * i as f64 / n as f64;
                Complex::new(phase.sin(), 0.0)
            })
            .collect();
        engine.forward(&mut buffer).unwrap();

        let peak = (0..n / 2)
            .max_by(|&a, &b| buffer[a].norm().partial_cmp(&buffer[b].norm()).unwrap())
            .unwrap();
        assert_eq!(peak, 5);
    }
}
