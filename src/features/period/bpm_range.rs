//! BPM search range resolution
//!
//! Callers may pass both bounds, one, or none. Missing bounds are derived from
//! the other bound or from a previous estimate, and the result is always at
//! least `min_span_bpm` wide.

use crate::config::TempoConfig;

/// Inclusive BPM search range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BpmRange {
    /// Lowest tempo considered
    pub min_bpm: f64,
    /// Highest tempo considered
    pub max_bpm: f64,
}

impl BpmRange {
    /// Range with the given bounds (swapped if reversed)
    pub fn new(min_bpm: f64, max_bpm: f64) -> Self {
        if min_bpm <= max_bpm {
            Self { min_bpm, max_bpm }
        } else {
            Self {
                min_bpm: max_bpm,
                max_bpm: min_bpm,
            }
        }
    }

    /// True if `bpm` lies within the range (inclusive)
    pub fn contains(&self, bpm: f64) -> bool {
        bpm >= self.min_bpm && bpm <= self.max_bpm
    }

    /// Width of the range in BPM
    pub fn span(&self) -> f64 {
        self.max_bpm - self.min_bpm
    }
}

fn usable(bound: Option<f64>) -> Option<f64> {
    bound.filter(|b| b.is_finite() && *b > 0.0)
}

/// Resolve the search range from optional bounds and an optional hint
///
/// - no bounds, hint: `[hint / 2, hint * 2]` clamped to the hard limits
/// - no bounds, no hint: the configured default range
/// - one bound: the other is twice / half of it, clamped the same way
/// - both bounds: used as given
///
/// A range narrower than `min_span_bpm` is padded by `span_padding_bpm` on
/// each side. Non-positive or non-finite bounds and hints count as absent.
pub fn resolve_bpm_range(
    min_bpm: Option<f64>,
    max_bpm: Option<f64>,
    hint: Option<f64>,
    config: &TempoConfig,
) -> BpmRange {
    let clamp = |bpm: f64| bpm.clamp(config.clamp_min_bpm, config.clamp_max_bpm);

    let mut range = match (usable(min_bpm), usable(max_bpm)) {
        (Some(lo), Some(hi)) => BpmRange::new(lo, hi),
        (Some(lo), None) => BpmRange::new(lo, clamp(lo * 2.0)),
        (None, Some(hi)) => BpmRange::new(clamp(hi * 0.5), hi),
        (None, None) => match usable(hint) {
            Some(h) => BpmRange::new(clamp(h / 2.0), clamp(h * 2.0)),
            None => BpmRange::new(config.default_min_bpm, config.default_max_bpm),
        },
    };

    if range.span() < config.min_span_bpm {
        range = BpmRange {
            min_bpm: (range.min_bpm - config.span_padding_bpm).max(1.0),
            max_bpm: range.max_bpm + config.span_padding_bpm,
        };
    }

    log::debug!(
        "Resolved BPM range [{:.1}, {:.1}] (min={:?}, max={:?}, hint={:?})",
        range.min_bpm,
        range.max_bpm,
        min_bpm,
        max_bpm,
        hint
    );

    range
}
