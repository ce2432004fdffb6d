//! Translation of ffmpeg `-progress` telemetry into percentages.
//!
//! ffmpeg prints `key=value` lines in blocks, each terminated by a
//! `progress=continue` or `progress=end` line. The tracker remembers the most
//! recent output timestamp and emits one [`Progress`] per terminator.

use std::time::Duration;

/// One progress update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// Output timestamp reached by the engine.
    pub elapsed: Duration,
    /// Completion in `[0, 100]`, or `None` when the duration is unknown.
    pub percent: Option<f64>,
}

/// Stateful parser for a `-progress` stream.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    duration_secs: Option<f64>,
    last_out_time: Option<Duration>,
}

impl ProgressTracker {
    /// `duration_secs` is the probed input duration; `None` or a
    /// non-positive value disables percentages.
    pub fn new(duration_secs: Option<f64>) -> Self {
        Self {
            duration_secs: duration_secs.filter(|d| d.is_finite() && *d > 0.0),
            last_out_time: None,
        }
    }

    /// Feed one line, returning an update at the end of each block.
    pub fn feed(&mut self, line: &str) -> Option<Progress> {
        let (key, value) = line.trim().split_once('=')?;
        let value = value.trim();

        match key.trim() {
            // out_time_ms is microseconds too, despite the name.
            "out_time_us" | "out_time_ms" => {
                if let Some(t) = parse_micros(value) {
                    self.last_out_time = Some(t);
                }
                None
            }
            "out_time" => {
                if let Some(t) = parse_timestamp(value) {
                    self.last_out_time = Some(t);
                }
                None
            }
            "progress" => {
                let elapsed = self.last_out_time?;
                Some(Progress {
                    elapsed,
                    percent: percent(elapsed, self.duration_secs),
                })
            }
            _ => None,
        }
    }
}

/// Completion percentage of `elapsed` against `duration_secs`, clamped.
pub fn percent(elapsed: Duration, duration_secs: Option<f64>) -> Option<f64> {
    let duration = duration_secs.filter(|d| d.is_finite() && *d > 0.0)?;
    Some((elapsed.as_secs_f64() / duration * 100.0).clamp(0.0, 100.0))
}

/// Negative values (ffmpeg prints them before the first packet) count as zero.
fn parse_micros(raw: &str) -> Option<Duration> {
    let us = raw.parse::<i64>().ok()?;
    Some(Duration::from_micros(us.max(0) as u64))
}

/// `HH:MM:SS[.ffffff]`, optionally signed.
fn parse_timestamp(raw: &str) -> Option<Duration> {
    let (negative, raw) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };

    let mut parts = raw.split(':');
    let hours = parts.next()?.parse::<u64>().ok()?;
    let minutes = parts.next()?.parse::<u64>().ok()?;
    let seconds = parts.next()?.parse::<f64>().ok()?;
    if parts.next().is_some() || minutes >= 60 || !seconds.is_finite() || seconds < 0.0 {
        return None;
    }

    if negative {
        return Some(Duration::ZERO);
    }
    let whole = hours.checked_mul(3600)?.checked_add(minutes * 60)?;
    Duration::try_from_secs_f64(whole as f64 + seconds).ok()
}
