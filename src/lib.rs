//! # Groove Scan
//!
//! Tempo, meter and key estimation for short audio clips, built for tools that
//! auto-tag imported samples and loops.
//!
//! ## Features
//!
//! - **BPM Detection**: Spectral flux novelty, FFT autocorrelation, parabolic
//!   lag refinement and half/double tempo disambiguation
//! - **Timing**: Beats-per-bar classification from accent periodicity, phase
//!   contrast and template fit, reported as a ratio in [0.125, 1.0]
//! - **Key Detection**: HPCP-style chroma with Krumhansl-Kessler template matching
//!
//! ## Quick Start
//!
//! ```
//! use groove_scan::{analyze_window, AnalysisConfig, SampleWindow};
//!
//! // Three seconds of an A major chord
//! let samples: Vec<f32> = (0..44100 * 3)
//!     .map(|i| {
//!         let t = i as f32 / 44100.0;
//!         [220.0f32, 277.18, 329.63]
//!             .iter()
//!             .map(|f| (2.0 * std::f32::consts::PI * f * t).sin() / 3.0)
//!             .sum::<f32>()
//!     })
//!     .collect();
//!
//! let window = SampleWindow::mono(&samples, 44100)?;
//! let result = analyze_window(&window, &AnalysisConfig::default())?;
//!
//! if let Some(key) = result.key {
//!     println!("Key: {} (confidence: {:.2})", key.key.name(), key.confidence);
//! }
//! # Ok::<(), groove_scan::AnalysisError>(())
//! ```
//!
//! Hosts that track a playback position use [`Analyzer`] instead: it pulls
//! windows from a [`BufferProvider`], reports scan timings to a [`MetricsSink`]
//! and turns failures into sentinel values.
//!
//! ## Architecture
//!
//! ```text
//! Window → Downmix → Novelty → ACF → Tempo → Meter
//!                  ↘ Chroma → Key
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod features;
pub mod fft;
pub mod io;
pub mod preprocessing;

// Re-export main types
pub use analysis::metrics::MetricsSink;
pub use analysis::result::{
    AnalysisMetadata, AnalysisResult, Key, KeyEstimate, MeterEstimate, TempoEstimate,
};
pub use analysis::scanner::{
    scan_bpm_window, scan_key_window, scan_timing_window, AnalysisHints, Analyzer,
};
pub use config::AnalysisConfig;
pub use error::AnalysisError;
pub use io::{BufferProvider, InMemoryBuffer, SampleWindow, WindowRequest};

use analysis::scanner::{key_of_samples, window_novelty};
use features::beat_tracking::classify_meter;
use features::key::KeyTemplates;
use features::period::{estimate_tempo, resolve_bpm_range};
use fft::RustFftEngine;

/// Run tempo, meter and key analysis on one window
///
/// The window is downmixed once and its novelty curve is shared by the tempo
/// and meter stages; the meter grid uses the tempo just found. Stages that find
/// nothing (no pulse, too few beats, no tonal energy) leave their field `None`.
///
/// # Arguments
///
/// * `window` - Interleaved samples with their sample rate and channel count
/// * `config` - Analysis configuration parameters
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for an empty window; numerical and
/// processing failures of any stage propagate.
///
/// # Example
///
/// ```
/// use groove_scan::{analyze_window, AnalysisConfig, SampleWindow};
///
/// let silence = vec![0.0f32; 44100 * 2];
/// let window = SampleWindow::mono(&silence, 44100)?;
/// let result = analyze_window(&window, &AnalysisConfig::default())?;
/// assert!(result.tempo.is_none());
/// assert!(result.key.is_none());
/// # Ok::<(), groove_scan::AnalysisError>(())
/// ```
pub fn analyze_window(
    window: &SampleWindow<'_>,
    config: &AnalysisConfig,
) -> Result<AnalysisResult, AnalysisError> {
    use std::time::Instant;
    let start_time = Instant::now();

    log::debug!(
        "Starting window analysis: {} frames x {} channels at {} Hz",
        window.frames(),
        window.channels(),
        window.sample_rate()
    );

    let engine = RustFftEngine::new();
    let samples = preprocessing::downmix(window)?;
    let sample_rate = window.sample_rate();

    let novelty = window_novelty(&samples, sample_rate, &engine)?;
    let range = resolve_bpm_range(None, None, None, &config.tempo);
    let tempo = estimate_tempo(&novelty, range, &config.tempo, &engine)?;

    let meter = match classify_meter(&novelty, tempo.map(|t| t.bpm), config, &engine) {
        Ok(meter) => Some(meter),
        Err(AnalysisError::InsufficientData(msg)) => {
            log::warn!("No meter estimate: {}", msg);
            None
        }
        Err(e) => return Err(e),
    };

    let key = key_of_samples(&samples, sample_rate, config, &KeyTemplates::new(), &engine)?;

    let mut metadata =
        AnalysisMetadata::new(window.duration_seconds(), sample_rate, window.channels());
    metadata.processing_time_ms = start_time.elapsed().as_secs_f64() * 1000.0;

    log::debug!(
        "Window analysis done in {:.2} ms: tempo={:?}, meter={:?}, key={:?}",
        metadata.processing_time_ms,
        tempo.map(|t| t.bpm),
        meter.as_ref().map(|m| m.best_k),
        key.map(|k| k.key.name())
    );

    Ok(AnalysisResult {
        tempo,
        meter,
        key,
        metadata,
    })
}
