//! FFT-accelerated autocorrelation
//!
//! Uses the Wiener–Khinchin identity: `ACF = IFFT(|FFT(signal)|²)`. The signal
//! is zero-padded to at least twice its length so the circular correlation
//! equals the linear one, and the result is normalized so that `ACF[0] = 1`.
//!
//! # Reference
//!
//! Ellis, D. P. W., & Pikrakis, A. (2006). Real-time Beat Induction.
//! *Proceedings of the International Conference on Music Information Retrieval*.
//!
//! # Example
//!
//! ```
//! use groove_scan::features::period::autocorrelation::autocorrelation;
//! use groove_scan::fft::RustFftEngine;
//!
//! let signal = vec![1.0, -1.0, 1.0, -1.0, 1.0, -1.0];
//! let acf = autocorrelation(&signal, &RustFftEngine::new())?;
//! assert!((acf[0] - 1.0).abs() < 1e-9);
//! assert!(acf[1] < 0.0 && acf[2] > 0.0);
//! # Ok::<(), groove_scan::AnalysisError>(())
//! ```

use crate::error::AnalysisError;
use crate::fft::FftEngine;
use rustfft::num_complex::Complex;

/// Floor for the zero-lag value used as the normalizer
const EPSILON: f64 = 1e-12;

/// Normalized autocorrelation of a real sequence
///
/// Returns one value per lag `0..signal.len()`, with `ACF[0] = 1` unless the
/// signal has no energy (then every lag is ~0). An empty signal yields an
/// empty ACF.
pub fn autocorrelation(signal: &[f64], engine: &dyn FftEngine) -> Result<Vec<f64>, AnalysisError> {
    let n = signal.len();
    if n == 0 {
        return Ok(Vec::new());
    }

    let fft_size = (2 * n).next_power_of_two();
    let mut buffer: Vec<Complex<f64>> = signal.iter().map(|&x| Complex::new(x, 0.0)).collect();
    buffer.resize(fft_size, Complex::new(0.0, 0.0));

    engine.forward(&mut buffer)?;
    for bin in buffer.iter_mut() {
        *bin = Complex::new(bin.norm_sqr(), 0.0);
    }
    engine.inverse(&mut buffer)?;

    let zero_lag = buffer[0].re.max(EPSILON);
    let acf: Vec<f64> = buffer[..n].iter().map(|c| c.re / zero_lag).collect();

    if acf.iter().any(|v| !v.is_finite()) {
        return Err(AnalysisError::NumericalError(
            "Non-finite autocorrelation value".to_string(),
        ));
    }

    Ok(acf)
}

/// Index of the largest ACF value in `[min_lag, max_lag]`
///
/// The first maximum wins on ties. Returns `None` for an empty range.
pub fn peak_lag(acf: &[f64], min_lag: usize, max_lag: usize) -> Option<usize> {
    if acf.is_empty() || min_lag > max_lag || min_lag >= acf.len() {
        return None;
    }
    let max_lag = max_lag.min(acf.len() - 1);

    let mut best = min_lag;
    for lag in (min_lag + 1)..=max_lag {
        if acf[lag] > acf[best] {
            best = lag;
        }
    }
    Some(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fft::RustFftEngine;

    #[test]
    fn test_zero_lag_is_one() {
        let signal: Vec<f64> = (0..50).map(|i| (i as f64 * 0.7).sin()).collect();
        let acf = autocorrelation(&signal, &RustFftEngine::new()).unwrap();
        assert_eq!(acf.len(), signal.len());
        assert!((acf[0] - 1.0).abs() < 1e-9);
        assert!(acf.iter().all(|v| v.abs() <= 1.0 + 1e-9));
    }

    #[test]
    fn test_periodic_signal_peaks_at_period() {
        let period = 7;
        let signal: Vec<f64> = (0..140)
            .map(|i| if i % period == 0 { 1.0 } else { 0.0 })
            .collect();
        let mean = signal.iter().sum::<f64>() / signal.len() as f64;
        let centered: Vec<f64> = signal.iter().map(|x| x - mean).collect();

        let acf = autocorrelation(&centered, &RustFftEngine::new()).unwrap();
        let best = peak_lag(&acf, 1, acf.len() - 1).unwrap();
        assert!(
            (best as i64 - period as i64).abs() <= 1,
            "Expected peak near lag {}, got {}",
            period,
            best
        );
    }

    #[test]
    fn test_empty_and_silent_signals() {
        let engine = RustFftEngine::new();
        assert!(autocorrelation(&[], &engine).unwrap().is_empty());

        let acf = autocorrelation(&[0.0; 16], &engine).unwrap();
        assert!(acf.iter().all(|v| v.abs() < 1e-6));
    }

    #[test]
    fn test_peak_lag_ranges() {
        let acf = vec![1.0, 0.2, 0.5, 0.4, 0.5, 0.1];
        assert_eq!(peak_lag(&acf, 1, 5), Some(2));
        assert_eq!(peak_lag(&acf, 3, 10), Some(4));
        assert_eq!(peak_lag(&acf, 4, 3), None);
        assert_eq!(peak_lag(&acf, 6, 8), None);
    }
}
