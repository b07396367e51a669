//! Analysis result types

use serde::{Deserialize, Serialize};

/// Bar groupings (beats per bar) the meter classifier considers
pub const METER_CANDIDATES: [u32; 9] = [2, 3, 4, 5, 6, 7, 8, 9, 12];

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Musical key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// Major key (0 = C, 1 = C#, ..., 11 = B)
    Major(u32),
    /// Minor key (0 = C, 1 = C#, ..., 11 = B)
    Minor(u32),
}

impl Key {
    /// Tonic pitch class (0 = C)
    pub fn root(&self) -> u32 {
        match self {
            Key::Major(i) | Key::Minor(i) => *i % 12,
        }
    }

    /// True for minor keys
    pub fn is_minor(&self) -> bool {
        matches!(self, Key::Minor(_))
    }

    /// Full key name, e.g. "C major" or "A minor"
    ///
    /// # Example
    ///
    /// ```
    /// use groove_scan::analysis::result::Key;
    ///
    /// assert_eq!(Key::Major(0).name(), "C major");
    /// assert_eq!(Key::Minor(9).name(), "A minor");
    /// assert_eq!(Key::Major(6).name(), "F# major");
    /// ```
    pub fn name(&self) -> String {
        let mode = if self.is_minor() { "minor" } else { "major" };
        format!("{} {}", NOTE_NAMES[self.root() as usize], mode)
    }

    /// Short notation, e.g. "C", "F#" or "Am"
    pub fn short_name(&self) -> String {
        let note = NOTE_NAMES[self.root() as usize];
        if self.is_minor() {
            format!("{}m", note)
        } else {
            note.to_string()
        }
    }
}

/// Tempo estimate for one window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoEstimate {
    /// Tempo in BPM, rounded to 0.1
    pub bpm: f64,

    /// Normalized ACF strength at the chosen lag (0.0-1.0)
    pub confidence: f64,

    /// Beat period in novelty frames
    pub lag: f64,
}

/// Score of every meter candidate, `None` where a grouping did not fit
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MeterScores {
    values: [Option<f64>; 9],
}

impl MeterScores {
    fn index(k: u32) -> Option<usize> {
        METER_CANDIDATES.iter().position(|&c| c == k)
    }

    /// Score of grouping `k`, if it was evaluated
    pub fn get(&self, k: u32) -> Option<f64> {
        Self::index(k).and_then(|i| self.values[i])
    }

    /// Record the score of grouping `k`; non-candidates are ignored
    pub fn set(&mut self, k: u32, score: f64) {
        if let Some(i) = Self::index(k) {
            self.values[i] = Some(score);
        }
    }

    /// Highest-scoring grouping; the smaller K wins ties
    pub fn best(&self) -> Option<(u32, f64)> {
        self.iter().fold(None, |best, (k, score)| match best {
            Some((_, best_score)) if score <= best_score => best,
            _ => Some((k, score)),
        })
    }

    /// Evaluated groupings in ascending K
    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        METER_CANDIDATES
            .iter()
            .zip(self.values.iter())
            .filter_map(|(&k, score)| score.map(|s| (k, s)))
    }
}

/// Meter estimate for one window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeterEstimate {
    /// Beats per bar after harmonic-chain resolution
    pub best_k: u32,

    /// Timing ratio in [0.125, 1.0]
    pub normalized_timing: f64,

    /// Raw score of each candidate grouping
    pub scores: MeterScores,
}

/// Key estimate for one window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyEstimate {
    /// Detected key
    pub key: Key,

    /// Margin of the best key over the runner-up (0.0-1.0)
    pub confidence: f64,
}

/// Combined analysis of one window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Tempo, `None` if the window has no usable pulse
    pub tempo: Option<TempoEstimate>,

    /// Meter, `None` if the beat grid was too short
    pub meter: Option<MeterEstimate>,

    /// Key, `None` if the window carries no tonal energy
    pub key: Option<KeyEstimate>,

    /// Analysis metadata
    pub metadata: AnalysisMetadata,
}

/// Analysis metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    /// Window duration in seconds
    pub duration_seconds: f64,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Channels in the analyzed window
    pub channels: u16,

    /// Processing time in milliseconds
    pub processing_time_ms: f64,

    /// Algorithm version
    pub algorithm_version: String,
}

impl AnalysisMetadata {
    /// Metadata stamped with the crate version
    pub fn new(duration_seconds: f64, sample_rate: u32, channels: u16) -> Self {
        Self {
            duration_seconds,
            sample_rate,
            channels,
            processing_time_ms: 0.0,
            algorithm_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_name() {
        assert_eq!(Key::Major(0).name(), "C major");
        assert_eq!(Key::Major(11).name(), "B major");
        assert_eq!(Key::Minor(9).name(), "A minor");
        assert_eq!(Key::Minor(1).name(), "C# minor");
    }

    #[test]
    fn test_key_short_name() {
        assert_eq!(Key::Major(0).short_name(), "C");
        assert_eq!(Key::Major(6).short_name(), "F#");
        assert_eq!(Key::Minor(9).short_name(), "Am");
        assert_eq!(Key::Minor(3).short_name(), "D#m");
    }

    #[test]
    fn test_key_root_wraps() {
        assert_eq!(Key::Major(14).root(), 2);
        assert!(Key::Minor(0).is_minor());
        assert!(!Key::Major(0).is_minor());
    }

    #[test]
    fn test_meter_scores() {
        let mut scores = MeterScores::default();
        assert_eq!(scores.best(), None);

        scores.set(3, 0.4);
        scores.set(4, 0.7);
        scores.set(8, 0.7);
        scores.set(10, 9.0);

        assert_eq!(scores.get(4), Some(0.7));
        assert_eq!(scores.get(5), None);
        assert_eq!(scores.get(10), None);
        assert_eq!(scores.best(), Some((4, 0.7)));
        assert_eq!(scores.iter().map(|(k, _)| k).collect::<Vec<_>>(), vec![3, 4, 8]);
    }

    #[test]
    fn test_result_serializes() {
        let mut scores = MeterScores::default();
        scores.set(4, 0.5);
        let result = AnalysisResult {
            tempo: Some(TempoEstimate {
                bpm: 128.0,
                confidence: 0.8,
                lag: 10.1,
            }),
            meter: Some(MeterEstimate {
                best_k: 4,
                normalized_timing: 1.0,
                scores,
            }),
            key: Some(KeyEstimate {
                key: Key::Minor(9),
                confidence: 0.2,
            }),
            metadata: AnalysisMetadata::new(3.0, 44100, 2),
        };

        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"Minor\":9"));
        let parsed: AnalysisResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, result);
    }
}
