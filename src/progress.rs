//! Download progress bookkeeping and the console bar.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::{Duration, Instant};

pub const THROTTLE: Duration = Duration::from_millis(30);
pub const BAR_WIDTH: usize = 40;

/// Turns received byte counts into throttled, never-decreasing percentages.
#[derive(Debug)]
pub struct ProgressTracker {
    total: Option<u64>,
    received: u64,
    percent: f64,
    throttle: Duration,
    last_emit: Option<Instant>,
}

impl ProgressTracker {
    pub fn new(total: Option<u64>) -> Self {
        Self::with_throttle(total, THROTTLE)
    }

    pub fn with_throttle(total: Option<u64>, throttle: Duration) -> Self {
        Self {
            total: total.filter(|&t| t > 0),
            received: 0,
            percent: 0.0,
            throttle,
            last_emit: None,
        }
    }

    pub fn received(&self) -> u64 {
        self.received
    }

    /// Records `bytes` more and returns the percentage to display, if an
    /// update is due. Without a known length there is nothing to report
    /// until [`finish`](Self::finish).
    pub fn advance(&mut self, bytes: u64, now: Instant) -> Option<f64> {
        self.received = self.received.saturating_add(bytes);
        let total = self.total?;

        let percent = (self.received as f64 / total as f64 * 100.0).min(100.0);
        if percent > self.percent {
            self.percent = percent;
        }

        if let Some(last) = self.last_emit {
            if now.duration_since(last) < self.throttle {
                return None;
            }
        }
        self.last_emit = Some(now);
        Some(self.percent)
    }

    pub fn finish(&mut self) -> f64 {
        self.percent = 100.0;
        self.percent
    }
}

/// Console bar for one download, driven in percent.
pub struct DownloadBar {
    bar: ProgressBar,
}

impl DownloadBar {
    pub fn new() -> Self {
        Self::with_draw_target(ProgressDrawTarget::stdout())
    }

    pub fn with_draw_target(target: ProgressDrawTarget) -> Self {
        let style = ProgressStyle::with_template(&format!("Downloading [{{bar:{}}}]", BAR_WIDTH))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("== ");
        let bar = ProgressBar::with_draw_target(Some(100), target);
        bar.set_style(style);
        Self { bar }
    }

    pub fn set(&self, percent: f64) {
        let position = percent.clamp(0.0, 100.0).floor() as u64;
        if position > self.bar.position() {
            self.bar.set_position(position);
        }
    }

    /// Draws the full bar and leaves it on screen.
    pub fn finish(&self) {
        self.bar.set_position(100);
        self.bar.finish();
    }

    /// Leaves the bar where it stopped, so an error message can follow it.
    pub fn abandon(&self) {
        self.bar.abandon();
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn is_finished(&self) -> bool {
        self.bar.is_finished()
    }
}

impl Default for DownloadBar {
    fn default() -> Self {
        Self::new()
    }
}
