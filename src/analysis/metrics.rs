//! Timing telemetry collaborator

/// Metric recorded by [`crate::Analyzer::scan_bpm`]
pub const BEAT_SCAN: &str = "beatScan";

/// Metric recorded by [`crate::Analyzer::scan_timing`]
pub const TIMING_SCAN: &str = "TimingScan";

/// Metric recorded by [`crate::Analyzer::scan_key`]
pub const KEY_SCAN: &str = "KeyScan";

/// Receiver of named wall-clock timings
///
/// Calls are fire-and-forget; a sink must not fail or block the scan.
pub trait MetricsSink {
    /// Record `millis` milliseconds under `name`
    fn set_metric(&self, name: &str, millis: f64);
}

/// Discards every metric
impl MetricsSink for () {
    fn set_metric(&self, _name: &str, _millis: f64) {}
}

impl<T: MetricsSink + ?Sized> MetricsSink for &T {
    fn set_metric(&self, name: &str, millis: f64) {
        (**self).set_metric(name, millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(String, f64)>>);

    impl MetricsSink for Recorder {
        fn set_metric(&self, name: &str, millis: f64) {
            if let Ok(mut entries) = self.0.lock() {
                entries.push((name.to_string(), millis));
            }
        }
    }

    #[test]
    fn test_borrowed_sink_forwards() {
        let recorder = Recorder::default();
        let sink = &recorder;
        sink.set_metric(BEAT_SCAN, 1.5);
        ().set_metric(KEY_SCAN, 2.0);

        let entries = recorder.0.lock().unwrap();
        assert_eq!(entries.as_slice(), &[(BEAT_SCAN.to_string(), 1.5)]);
    }
}
