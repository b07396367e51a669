//! Configuration parameters for tempo, meter and key analysis
//!
//! Most of the constants below were tuned by ear on typical sample-library
//! material. Changing them changes results; the comparison semantics that use
//! them (strict vs. non-strict, bias direction) are fixed in code.

/// Tempo estimation parameters
#[derive(Debug, Clone)]
pub struct TempoConfig {
    /// Lower bound used when the caller gives no bounds and no hint (default: 50.0)
    pub default_min_bpm: f64,

    /// Upper bound used when the caller gives no bounds and no hint (default: 200.0)
    pub default_max_bpm: f64,

    /// Hard floor for auto-ranged bounds (default: 30.0)
    pub clamp_min_bpm: f64,

    /// Hard ceiling for auto-ranged bounds (default: 260.0)
    pub clamp_max_bpm: f64,

    /// Minimum width of the search range in BPM (default: 10.0)
    pub min_span_bpm: f64,

    /// Padding applied to each side when the range is narrower than `min_span_bpm` (default: 5.0)
    pub span_padding_bpm: f64,

    /// Relative tolerance for half/double tempo replacement (default: 0.05)
    pub harmonic_tolerance: f64,

    /// Shortest novelty curve that still yields an estimate (default: 8)
    pub min_novelty_len: usize,

    /// Largest window an auto-ranged BPM scan widens to, in samples (default: 131072)
    pub max_auto_window: usize,
}

impl Default for TempoConfig {
    fn default() -> Self {
        Self {
            default_min_bpm: 50.0,
            default_max_bpm: 200.0,
            clamp_min_bpm: 30.0,
            clamp_max_bpm: 260.0,
            min_span_bpm: 10.0,
            span_padding_bpm: 5.0,
            harmonic_tolerance: 0.05,
            min_novelty_len: 8,
            max_auto_window: 131_072,
        }
    }
}

/// Meter classification parameters
#[derive(Debug, Clone)]
pub struct MeterConfig {
    /// Relative tolerance for the harmonic-chain tie-break (default: 0.12)
    pub chain_tolerance: f64,

    /// Weight of the periodicity term (default: 0.55)
    pub periodicity_weight: f64,

    /// Weight of the phase contrast term (default: 0.20)
    pub contrast_weight: f64,

    /// Weight of the template correlation term (default: 0.50)
    pub template_weight: f64,

    /// Multiplicative bias for K = 2 (default: 0.92)
    pub duple_bias: f64,

    /// Multiplicative bias for K = 4 (default: 1.04)
    pub quadruple_bias: f64,

    /// Multiplicative bias for any K divisible by 3 (default: 1.06)
    pub triple_bias: f64,

    /// Template level on the downbeat (default: 1.0)
    pub template_downbeat: f64,

    /// Template level on unaccented beats (default: 0.25)
    pub template_weak: f64,

    /// Template level at K/2 when K is divisible by 4 (default: 0.6)
    pub template_half_bar: f64,

    /// Template level at K/3 and 2K/3 when K is divisible by 3 (default: 0.5)
    pub template_third_bar: f64,
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            chain_tolerance: 0.12,
            periodicity_weight: 0.55,
            contrast_weight: 0.20,
            template_weight: 0.50,
            duple_bias: 0.92,
            quadruple_bias: 1.04,
            triple_bias: 1.06,
            template_downbeat: 1.0,
            template_weak: 0.25,
            template_half_bar: 0.6,
            template_third_bar: 0.5,
        }
    }
}

/// Chroma extraction parameters
#[derive(Debug, Clone)]
pub struct ChromaConfig {
    /// Lowest analysed frequency in Hz (default: 50.0)
    pub min_frequency: f64,

    /// Highest analysed frequency in Hz, further capped at Nyquist - 1 (default: 5000.0)
    pub max_frequency: f64,

    /// Number of harmonics accumulated per bin (default: 5)
    pub harmonics: usize,

    /// Tuning reference for A4 in Hz (default: 440.0)
    pub reference_frequency: f64,

    /// L1-normalize each frame before summing (default: true)
    pub normalize_frames: bool,
}

impl Default for ChromaConfig {
    fn default() -> Self {
        Self {
            min_frequency: 50.0,
            max_frequency: 5000.0,
            harmonics: 5,
            reference_frequency: 440.0,
            normalize_frames: true,
        }
    }
}

/// Analysis configuration parameters
#[derive(Debug, Clone, Default)]
pub struct AnalysisConfig {
    /// Tempo estimation
    pub tempo: TempoConfig,

    /// Meter classification
    pub meter: MeterConfig,

    /// Chroma extraction
    pub chroma: ChromaConfig,
}
