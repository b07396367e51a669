//! Scan façade
//!
//! [`Analyzer`] is what a host talks to. Each scan pulls a mono window from
//! the host's [`BufferProvider`], runs one pipeline, reports its wall-clock time
//! to the [`MetricsSink`] and returns a plain value. Failures never reach the
//! caller as errors: they are logged and replaced by a sentinel (`-1.0` for
//! tempo and timing, `"Unknown"` for the key).
//!
//! The window-level functions below run the same pipelines on a
//! [`SampleWindow`] the caller already holds and return `Result`s.
//!
//! # Example
//!
//! ```
//! use groove_scan::{Analyzer, InMemoryBuffer};
//!
//! // Two seconds of silence: analyzable, but no pulse
//! let buffer = InMemoryBuffer::new(vec![0.0; 88200], 44100, 1);
//! let mut analyzer = Analyzer::new(buffer, ());
//! assert_eq!(analyzer.scan_bpm(44100, 0, None, None), 0.0);
//! assert_eq!(analyzer.scan_key(44100, 0), "Unknown");
//! ```

use super::metrics::{MetricsSink, BEAT_SCAN, KEY_SCAN, TIMING_SCAN};
use super::result::{KeyEstimate, MeterEstimate, TempoEstimate};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::features::beat_tracking::classify_meter;
use crate::features::chroma::extract_chroma;
use crate::features::key::{detect_key, KeyTemplates};
use crate::features::period::{
    estimate_tempo, resolve_bpm_range, spectral_flux_novelty, BpmRange, NoveltyCurve,
};
use crate::fft::{FftEngine, RustFftEngine};
use crate::io::{BufferProvider, SampleWindow, WindowRequest};
use crate::preprocessing::{analysis_fft_size, downmix};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Returned by tempo and timing scans that failed
pub const FAILED_SCAN: f64 = -1.0;

/// Returned by key scans that failed or found no key
pub const UNKNOWN_KEY: &str = "Unknown";

/// Results of earlier scans, reused to steer later ones
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisHints {
    /// Last tempo found; centers auto-ranged BPM searches and lays the beat
    /// grid for timing scans
    pub bpm: Option<f64>,

    /// Last timing ratio found
    pub timing: Option<f64>,
}

/// Scan façade over a host buffer
pub struct Analyzer<P, M> {
    provider: P,
    metrics: M,
    config: AnalysisConfig,
    engine: RustFftEngine,
    templates: KeyTemplates,
    hints: AnalysisHints,
}

impl<P: BufferProvider, M: MetricsSink> Analyzer<P, M> {
    /// Analyzer with the default configuration
    pub fn new(provider: P, metrics: M) -> Self {
        Self::with_config(provider, metrics, AnalysisConfig::default())
    }

    /// Analyzer with a custom configuration
    pub fn with_config(provider: P, metrics: M, config: AnalysisConfig) -> Self {
        Self {
            provider,
            metrics,
            config,
            engine: RustFftEngine::new(),
            templates: KeyTemplates::new(),
            hints: AnalysisHints::default(),
        }
    }

    /// The buffer provider
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Mutable access to the buffer provider, e.g. to move its position
    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    /// The metrics sink
    pub fn metrics(&self) -> &M {
        &self.metrics
    }

    /// Active configuration
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Cached hints from earlier scans
    pub fn hints(&self) -> AnalysisHints {
        self.hints
    }

    /// Replace the cached hints
    pub fn set_hints(&mut self, hints: AnalysisHints) {
        self.hints = hints;
    }

    /// Forget earlier results
    pub fn clear_hints(&mut self) {
        self.hints = AnalysisHints::default();
    }

    /// Estimate the tempo around the provider's position
    ///
    /// Missing bounds are derived from the other bound, the cached BPM hint, or
    /// the default range. Without any explicit bound the window is widened to
    /// twice `size_hint` (capped by the configured maximum).
    ///
    /// # Returns
    ///
    /// The tempo rounded to 0.1 BPM, `0.0` if the window has no usable pulse,
    /// or `-1.0` on failure.
    pub fn scan_bpm(
        &mut self,
        size_hint: usize,
        looking_range: usize,
        min_bpm: Option<f64>,
        max_bpm: Option<f64>,
    ) -> f64 {
        let start = Instant::now();

        let size = if min_bpm.is_none() && max_bpm.is_none() {
            (2 * size_hint)
                .min(self.config.tempo.max_auto_window)
                .max(size_hint)
        } else {
            size_hint
        };
        let range = resolve_bpm_range(min_bpm, max_bpm, self.hints.bpm, &self.config.tempo);

        let outcome = self.fetch(size, looking_range).and_then(|samples| {
            let window = SampleWindow::mono(&samples, self.provider.sample_rate())?;
            scan_bpm_window(&window, range, &self.config, &self.engine)
        });
        self.record(BEAT_SCAN, start);

        match outcome {
            Ok(Some(tempo)) => {
                self.hints.bpm = Some(tempo.bpm);
                tempo.bpm
            }
            Ok(None) => 0.0,
            Err(e) => {
                log::warn!("{} failed: {}", BEAT_SCAN, e);
                FAILED_SCAN
            }
        }
    }

    /// Estimate the timing ratio (beats per bar / 4, 8 or 12) around the position
    ///
    /// # Returns
    ///
    /// A ratio in `[0.125, 1.0]`, or `-1.0` on failure.
    pub fn scan_timing(&mut self, size_hint: usize, looking_range: usize) -> f64 {
        let start = Instant::now();

        let bpm_hint = self.hints.bpm;
        let outcome = self.fetch(size_hint, looking_range).and_then(|samples| {
            let window = SampleWindow::mono(&samples, self.provider.sample_rate())?;
            scan_timing_window(&window, bpm_hint, &self.config, &self.engine)
        });
        self.record(TIMING_SCAN, start);

        match outcome {
            Ok(meter) => {
                self.hints.timing = Some(meter.normalized_timing);
                meter.normalized_timing
            }
            Err(e) => {
                log::warn!("{} failed: {}", TIMING_SCAN, e);
                FAILED_SCAN
            }
        }
    }

    /// Estimate the key around the position
    ///
    /// # Returns
    ///
    /// A name such as `"C major"` or `"F# minor"`, or `"Unknown"` when the scan
    /// failed or the window carries no tonal energy.
    pub fn scan_key(&mut self, size_hint: usize, looking_range: usize) -> String {
        let start = Instant::now();

        let outcome = self.fetch(size_hint, looking_range).and_then(|samples| {
            let window = SampleWindow::mono(&samples, self.provider.sample_rate())?;
            key_of_window(&window, &self.config, &self.templates, &self.engine)
        });
        self.record(KEY_SCAN, start);

        match outcome {
            Ok(Some(estimate)) => estimate.key.name(),
            Ok(None) => UNKNOWN_KEY.to_string(),
            Err(e) => {
                log::warn!("{} failed: {}", KEY_SCAN, e);
                UNKNOWN_KEY.to_string()
            }
        }
    }

    fn fetch(&self, size: usize, looking_range: usize) -> Result<Vec<f32>, AnalysisError> {
        log::debug!(
            "Requesting {} mono frames (looking range {})",
            size,
            looking_range
        );
        self.provider
            .window(WindowRequest::centered_mono(size, looking_range))
    }

    fn record(&self, name: &str, start: Instant) {
        let millis = start.elapsed().as_secs_f64() * 1000.0;
        log::debug!("{} took {:.2} ms", name, millis);
        self.metrics.set_metric(name, millis);
    }
}

/// Novelty curve of a downmixed window at the analysis FFT size
pub(crate) fn window_novelty(
    samples: &[f64],
    sample_rate: u32,
    engine: &dyn FftEngine,
) -> Result<NoveltyCurve, AnalysisError> {
    spectral_flux_novelty(samples, sample_rate, analysis_fft_size(sample_rate), engine)
}

/// Tempo of a window within `range`
///
/// `Ok(None)` means the window was analyzable but has no usable pulse
/// (silence, or too short for the novelty curve).
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for an empty window; lower-layer
/// failures propagate.
pub fn scan_bpm_window(
    window: &SampleWindow<'_>,
    range: BpmRange,
    config: &AnalysisConfig,
    engine: &dyn FftEngine,
) -> Result<Option<TempoEstimate>, AnalysisError> {
    let samples = downmix(window)?;
    let novelty = window_novelty(&samples, window.sample_rate(), engine)?;
    estimate_tempo(&novelty, range, &config.tempo, engine)
}

/// Meter of a window, using `bpm_hint` for the beat grid when known
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for an empty window and
/// `AnalysisError::InsufficientData` when fewer than four beats fit.
pub fn scan_timing_window(
    window: &SampleWindow<'_>,
    bpm_hint: Option<f64>,
    config: &AnalysisConfig,
    engine: &dyn FftEngine,
) -> Result<MeterEstimate, AnalysisError> {
    let samples = downmix(window)?;
    let novelty = window_novelty(&samples, window.sample_rate(), engine)?;
    classify_meter(&novelty, bpm_hint, config, engine)
}

/// Key of a window; `Ok(None)` when it carries no tonal energy
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for an empty window.
pub fn scan_key_window(
    window: &SampleWindow<'_>,
    config: &AnalysisConfig,
    engine: &dyn FftEngine,
) -> Result<Option<KeyEstimate>, AnalysisError> {
    key_of_window(window, config, &KeyTemplates::new(), engine)
}

fn key_of_window(
    window: &SampleWindow<'_>,
    config: &AnalysisConfig,
    templates: &KeyTemplates,
    engine: &dyn FftEngine,
) -> Result<Option<KeyEstimate>, AnalysisError> {
    let samples = downmix(window)?;
    key_of_samples(&samples, window.sample_rate(), config, templates, engine)
}

pub(crate) fn key_of_samples(
    samples: &[f64],
    sample_rate: u32,
    config: &AnalysisConfig,
    templates: &KeyTemplates,
    engine: &dyn FftEngine,
) -> Result<Option<KeyEstimate>, AnalysisError> {
    let chroma = extract_chroma(
        samples,
        sample_rate,
        analysis_fft_size(sample_rate),
        &config.chroma,
        engine,
    )?;
    detect_key(&chroma, templates)
}
