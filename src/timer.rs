//! Named-stamp stopwatch used for per-plugin timing.
//!
//! A [`Timer`] records named instants; [`Timer::since`] measures the elapsed
//! time from a stamp, and [`pretty`] formats a duration for log output.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// A stopwatch with named stamps.
#[derive(Debug, Default)]
pub struct Timer {
    events: HashMap<String, Instant>,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current instant under `event`, replacing any prior stamp.
    pub fn stamp(&mut self, event: &str) -> &mut Self {
        self.events.insert(event.to_string(), Instant::now());
        self
    }

    /// Elapsed time since `event` was stamped; zero for unknown events.
    pub fn since(&self, event: &str) -> Duration {
        self.events
            .get(event)
            .map(|instant| instant.elapsed())
            .unwrap_or_default()
    }
}

/// Format a duration at a human scale: `250 µs`, `34 ms`, `1.52 s`, `2 min 5 s`.
pub fn pretty(duration: Duration) -> String {
    let micros = duration.as_micros();
    if micros < 1_000 {
        return format!("{micros} µs");
    }
    let millis = duration.as_millis();
    if millis < 1_000 {
        return format!("{millis} ms");
    }
    let secs = duration.as_secs_f64();
    if secs < 60.0 {
        return format!("{secs:.2} s");
    }
    let minutes = duration.as_secs() / 60;
    let seconds = duration.as_secs() % 60;
    format!("{minutes} min {seconds} s")
}
