//! Progress reporting
//!
//! Fetchers push [`ProgressSample`]s into an injected [`ProgressReporter`]. The
//! reporter is called synchronously from the read loop, so a slow reporter
//! throttles the download. Reporters that feed a display should hand samples
//! off without blocking, as [`ChannelReporter`] does.

use crate::types::ProgressSample;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::debug;

/// Sink for progress samples
pub trait ProgressReporter: Send + Sync {
    /// Receive one sample. Must not block.
    fn report(&self, sample: ProgressSample);
}

impl<F> ProgressReporter for F
where
    F: Fn(ProgressSample) + Send + Sync,
{
    fn report(&self, sample: ProgressSample) {
        self(sample)
    }
}

/// Reporter that discards every sample
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpReporter;

impl ProgressReporter for NoOpReporter {
    fn report(&self, _sample: ProgressSample) {}
}

/// Reporter that forwards samples over an unbounded channel
///
/// Sending never blocks. Samples sent after the receiver is dropped are discarded.
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    tx: mpsc::UnboundedSender<ProgressSample>,
}

impl ChannelReporter {
    /// Create a reporter and the receiver a display task reads from
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressSample>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressReporter for ChannelReporter {
    fn report(&self, sample: ProgressSample) {
        self.tx.send(sample).ok();
    }
}

/// Reporter that logs samples at debug level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn report(&self, sample: ProgressSample) {
        debug!(
            downloaded = sample.bytes_downloaded,
            total = sample.total_bytes,
            percent = ?sample.percent(),
            speed_bps = ?sample.speed_bps,
            eta_secs = ?sample.eta_secs,
            "download progress"
        );
    }
}

/// Smoothing factor for the speed estimate (weight of the newest interval)
const SPEED_SMOOTHING: f64 = 0.3;

/// Intervals shorter than this are folded into the next one
const MIN_SPEED_INTERVAL: Duration = Duration::from_millis(100);

/// Turns cumulative byte counts into samples with speed and ETA
///
/// Speed is an exponential moving average over intervals of at least
/// [`MIN_SPEED_INTERVAL`], so per-chunk jitter does not dominate.
#[derive(Debug)]
pub struct SpeedMeter {
    total_bytes: u64,
    last_instant: Instant,
    last_bytes: u64,
    speed_bps: Option<f64>,
}

impl SpeedMeter {
    /// Start measuring a transfer of `total_bytes` (0 if unknown)
    pub fn new(total_bytes: u64) -> Self {
        Self::starting_at(total_bytes, Instant::now())
    }

    fn starting_at(total_bytes: u64, now: Instant) -> Self {
        Self {
            total_bytes,
            last_instant: now,
            last_bytes: 0,
            speed_bps: None,
        }
    }

    /// Produce a sample for the cumulative `bytes_downloaded`
    pub fn sample(&mut self, bytes_downloaded: u64) -> ProgressSample {
        self.sample_at(bytes_downloaded, Instant::now())
    }

    fn sample_at(&mut self, bytes_downloaded: u64, now: Instant) -> ProgressSample {
        let elapsed = now.saturating_duration_since(self.last_instant);
        if elapsed >= MIN_SPEED_INTERVAL {
            let delta = bytes_downloaded.saturating_sub(self.last_bytes) as f64;
            let instant = delta / elapsed.as_secs_f64();
            self.speed_bps = Some(match self.speed_bps {
                Some(prev) => prev + SPEED_SMOOTHING * (instant - prev),
                None => instant,
            });
            self.last_instant = now;
            self.last_bytes = bytes_downloaded;
        }

        let eta_secs = match self.speed_bps {
            Some(speed) if speed > 0.0 && self.total_bytes > 0 => {
                let remaining = self.total_bytes.saturating_sub(bytes_downloaded) as f64;
                Some((remaining / speed).ceil() as u64)
            }
            _ => None,
        };

        ProgressSample {
            bytes_downloaded,
            total_bytes: self.total_bytes,
            speed_bps: self.speed_bps,
            eta_secs,
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn closure_reporter_receives_samples() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let reporter = move |s: ProgressSample| sink.lock().unwrap().push(s.bytes_downloaded);

        reporter.report(ProgressSample::new(10, 100));
        reporter.report(ProgressSample::new(20, 100));

        assert_eq!(*seen.lock().unwrap(), vec![10, 20]);
    }

    #[tokio::test]
    async fn channel_reporter_forwards_in_order() {
        let (reporter, mut rx) = ChannelReporter::new();

        reporter.report(ProgressSample::new(1, 0));
        reporter.report(ProgressSample::new(2, 0));
        drop(reporter);

        assert_eq!(rx.recv().await.unwrap().bytes_downloaded, 1);
        assert_eq!(rx.recv().await.unwrap().bytes_downloaded, 2);
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn channel_reporter_ignores_dropped_receiver() {
        let (reporter, rx) = ChannelReporter::new();
        drop(rx);

        // Must not panic
        reporter.report(ProgressSample::new(1, 1));
    }

    #[test]
    fn speed_meter_has_no_speed_before_first_interval() {
        let start = Instant::now();
        let mut meter = SpeedMeter::starting_at(1000, start);

        let sample = meter.sample_at(100, start + Duration::from_millis(10));

        assert_eq!(sample.bytes_downloaded, 100);
        assert_eq!(sample.total_bytes, 1000);
        assert!(sample.speed_bps.is_none());
        assert!(sample.eta_secs.is_none());
    }

    #[test]
    fn speed_meter_computes_speed_and_eta() {
        let start = Instant::now();
        let mut meter = SpeedMeter::starting_at(10_000, start);

        let sample = meter.sample_at(1_000, start + Duration::from_secs(1));

        assert_eq!(sample.speed_bps, Some(1_000.0));
        assert_eq!(sample.eta_secs, Some(9));
    }

    #[test]
    fn speed_meter_smooths_successive_intervals() {
        let start = Instant::now();
        let mut meter = SpeedMeter::starting_at(0, start);

        meter.sample_at(1_000, start + Duration::from_secs(1));
        let sample = meter.sample_at(3_000, start + Duration::from_secs(2));

        // 1000 + 0.3 * (2000 - 1000)
        let speed = sample.speed_bps.unwrap();
        assert!((speed - 1_300.0).abs() < 1e-6, "speed was {speed}");
    }

    #[test]
    fn speed_meter_without_total_has_no_eta() {
        let start = Instant::now();
        let mut meter = SpeedMeter::starting_at(0, start);

        let sample = meter.sample_at(5_000, start + Duration::from_secs(1));

        assert!(sample.speed_bps.is_some());
        assert_eq!(sample.total_bytes, 0);
        assert!(sample.eta_secs.is_none());
    }
}
