//! Key detection algorithm
//!
//! Scores the chroma vector against every major and minor template with a dot
//! product. The best of the 24 candidates is the key; confidence is the
//! relative margin over the runner-up:
//!
//! ```text
//! confidence = (best - max(0, second)) / best
//! ```
//!
//! A chroma vector with no energy scores 0 everywhere and yields no key.
//!
//! # Reference
//!
//! Krumhansl, C. L., & Kessler, E. J. (1982). Tracing the Dynamic Changes in Perceived
//! Tonal Organization in a Spatial Representation of Musical Keys. *Psychological Review*,
//! 89(4), 334-368.
//!
//! # Example
//!
//! ```
//! use groove_scan::analysis::result::Key;
//! use groove_scan::features::key::{detect_key, KeyTemplates};
//!
//! // C, E and G equally loud
//! let mut chroma = [0.0; 12];
//! chroma[0] = 1.0 / 3.0;
//! chroma[4] = 1.0 / 3.0;
//! chroma[7] = 1.0 / 3.0;
//!
//! let estimate = detect_key(&chroma, &KeyTemplates::new())?.expect("tonal input");
//! assert_eq!(estimate.key, Key::Major(0));
//! assert!(estimate.confidence > 0.0);
//! # Ok::<(), groove_scan::AnalysisError>(())
//! ```

use super::templates::KeyTemplates;
use crate::analysis::result::{Key, KeyEstimate};
use crate::error::AnalysisError;

/// Template scores for all 24 keys
///
/// Candidates come in a fixed order: C major through B major, then C minor
/// through B minor.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if `chroma` does not have 12 bins and
/// `AnalysisError::NumericalError` if any bin is not finite.
pub fn key_scores(
    chroma: &[f64],
    templates: &KeyTemplates,
) -> Result<Vec<(Key, f64)>, AnalysisError> {
    if chroma.len() != 12 {
        return Err(AnalysisError::InvalidInput(format!(
            "Chroma vector must have 12 elements, got {}",
            chroma.len()
        )));
    }
    if chroma.iter().any(|v| !v.is_finite()) {
        return Err(AnalysisError::NumericalError(
            "Chroma vector contains non-finite values".to_string(),
        ));
    }

    let dot = |template: [f64; 12]| -> f64 {
        chroma.iter().zip(template.iter()).map(|(c, t)| c * t).sum()
    };

    let mut scores = Vec::with_capacity(24);
    for root in 0..12 {
        scores.push((Key::Major(root), dot(templates.get_major_template(root))));
    }
    for root in 0..12 {
        scores.push((Key::Minor(root), dot(templates.get_minor_template(root))));
    }
    Ok(scores)
}

/// Detect the key of a 12-bin chroma vector
///
/// # Arguments
///
/// * `chroma` - Pitch-class energies, C through B
/// * `templates` - Key templates (Krumhansl-Kessler profiles)
///
/// # Returns
///
/// `Ok(None)` when no candidate scores above zero, otherwise the best key and
/// its confidence in `[0, 1]`. Exact ties go to the earlier candidate (major
/// before minor, lower tonic first).
///
/// # Errors
///
/// Same as [`key_scores`].
pub fn detect_key(
    chroma: &[f64],
    templates: &KeyTemplates,
) -> Result<Option<KeyEstimate>, AnalysisError> {
    log::debug!("Detecting key from chroma {:?}", chroma);

    let scores = key_scores(chroma, templates)?;

    let mut best: Option<(Key, f64)> = None;
    let mut second = f64::NEG_INFINITY;
    for &(key, score) in &scores {
        match best {
            Some((_, best_score)) if score <= best_score => {
                second = second.max(score);
            }
            Some((_, best_score)) => {
                second = best_score;
                best = Some((key, score));
            }
            None => best = Some((key, score)),
        }
    }

    let (key, best_score) = match best {
        Some(b) if b.1 > 0.0 => b,
        _ => {
            log::warn!("Chroma carries no tonal energy, no key estimate");
            return Ok(None);
        }
    };

    let confidence = ((best_score - second.max(0.0)) / best_score).clamp(0.0, 1.0);

    log::debug!(
        "Detected key: {}, score: {:.4}, runner-up: {:.4}, confidence: {:.4}",
        key.name(),
        best_score,
        second,
        confidence
    );

    Ok(Some(KeyEstimate { key, confidence }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chord(pitch_classes: &[usize]) -> [f64; 12] {
        let mut chroma = [0.0; 12];
        for &pc in pitch_classes {
            chroma[pc] = 1.0 / pitch_classes.len() as f64;
        }
        chroma
    }

    #[test]
    fn test_c_major_triad() {
        let estimate = detect_key(&chord(&[0, 4, 7]), &KeyTemplates::new())
            .unwrap()
            .unwrap();
        assert_eq!(estimate.key, Key::Major(0));
        // Runner-up is E minor.
        assert!(estimate.confidence > 0.05 && estimate.confidence < 0.15);
    }

    #[test]
    fn test_a_minor_triad() {
        let estimate = detect_key(&chord(&[9, 0, 4]), &KeyTemplates::new())
            .unwrap()
            .unwrap();
        assert_eq!(estimate.key, Key::Minor(9));
        assert!(estimate.confidence > 0.0);
    }

    #[test]
    fn test_transposition_moves_key() {
        let templates = KeyTemplates::new();
        for shift in 0..12 {
            let triad = [shift, (shift + 4) % 12, (shift + 7) % 12];
            let estimate = detect_key(&chord(&triad), &templates).unwrap().unwrap();
            assert_eq!(estimate.key, Key::Major(shift as u32));
        }
    }

    #[test]
    fn test_scale_weighting_is_robust() {
        // Full C major scale with a heavy tonic and dominant
        let mut chroma = [0.0; 12];
        for (pc, weight) in [(0, 3.0), (2, 1.0), (4, 1.5), (5, 1.0), (7, 2.5), (9, 1.0), (11, 0.8)] {
            chroma[pc] = weight;
        }
        let estimate = detect_key(&chroma, &KeyTemplates::new()).unwrap().unwrap();
        assert_eq!(estimate.key, Key::Major(0));
    }

    #[test]
    fn test_silent_chroma_has_no_key() {
        assert_eq!(detect_key(&[0.0; 12], &KeyTemplates::new()).unwrap(), None);
    }

    #[test]
    fn test_flat_chroma_has_no_confidence() {
        let estimate = detect_key(&[1.0 / 12.0; 12], &KeyTemplates::new())
            .unwrap()
            .unwrap();
        assert!(estimate.confidence < 1e-9);
    }

    #[test]
    fn test_invalid_chroma() {
        let templates = KeyTemplates::new();
        assert!(matches!(
            detect_key(&[0.1; 11], &templates),
            Err(AnalysisError::InvalidInput(_))
        ));
        let mut bad = [0.0; 12];
        bad[3] = f64::NAN;
        assert!(matches!(
            detect_key(&bad, &templates),
            Err(AnalysisError::NumericalError(_))
        ));
    }

    #[test]
    fn test_key_scores_order() {
        let scores = key_scores(&chord(&[0, 4, 7]), &KeyTemplates::new()).unwrap();
        assert_eq!(scores.len(), 24);
        assert_eq!(scores[0].0, Key::Major(0));
        assert_eq!(scores[11].0, Key::Major(11));
        assert_eq!(scores[12].0, Key::Minor(0));
        assert_eq!(scores[23].0, Key::Minor(11));
    }
}
