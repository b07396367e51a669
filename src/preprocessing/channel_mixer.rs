//! Channel mixing (interleaved multi-channel to mono)

use crate::error::AnalysisError;
use crate::io::SampleWindow;

/// Downmix a window to mono `f64` samples
///
/// Multi-channel windows are averaged frame by frame; a trailing partial frame
/// is dropped. Mono windows are copied through.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if the window holds no complete frame.
pub fn downmix(window: &SampleWindow<'_>) -> Result<Vec<f64>, AnalysisError> {
    if window.is_empty() {
        return Err(AnalysisError::InvalidInput(
            "Empty audio samples".to_string(),
        ));
    }

    let channels = window.channels() as usize;
    let samples = window.samples();

    if channels == 1 {
        return Ok(samples.iter().map(|&s| s as f64).collect());
    }

    log::debug!(
        "Downmixing {} frames of {} channels to mono",
        window.frames(),
        channels
    );

    let scale = 1.0 / channels as f64;
    Ok(samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().map(|&s| s as f64).sum::<f64>() * scale)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mono_passthrough() {
        let samples = [0.5f32, -0.25, 1.0];
        let window = SampleWindow::mono(&samples, 44100).unwrap();
        assert_eq!(downmix(&window).unwrap(), vec![0.5, -0.25, 1.0]);
    }

    #[test]
    fn test_stereo_average_drops_partial_frame() {
        let samples = [1.0f32, 0.0, 0.5, 0.5, 0.9];
        let window = SampleWindow::new(&samples, 44100, 2).unwrap();
        assert_eq!(downmix(&window).unwrap(), vec![0.5, 0.5]);
    }

    #[test]
    fn test_empty_window_is_invalid() {
        let window = SampleWindow::new(&[0.3], 44100, 2).unwrap();
        assert!(matches!(downmix(&window), Err(AnalysisError::InvalidInput(_))));
    }
}
