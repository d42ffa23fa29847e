use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Durations offered by the duration selector, in seconds
pub const ALLOWED_DURATIONS: [u64; 3] = [30, 60, 120];

/// Length of an attempt, restricted to [`ALLOWED_DURATIONS`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct TestDuration(u64);

impl TestDuration {
    pub fn secs(self) -> u64 {
        self.0
    }

    /// Label shown next to the result, e.g. `60s`
    pub fn label(self) -> String {
        format!("{}s", self.0)
    }

    fn position(self) -> usize {
        ALLOWED_DURATIONS
            .iter()
            .position(|&d| d == self.0)
            .unwrap_or(0)
    }

    /// Next longer duration, wrapping around to the shortest
    pub fn next(self) -> Self {
        let idx = (self.position() + 1) % ALLOWED_DURATIONS.len();
        Self(ALLOWED_DURATIONS[idx])
    }

    /// Next shorter duration, wrapping around to the longest
    pub fn prev(self) -> Self {
        let len = ALLOWED_DURATIONS.len();
        let idx = (self.position() + len - 1) % len;
        Self(ALLOWED_DURATIONS[idx])
    }
}

impl Default for TestDuration {
    fn default() -> Self {
        Self(60)
    }
}

impl TryFrom<u64> for TestDuration {
    type Error = Error;

    fn try_from(secs: u64) -> Result<Self> {
        if ALLOWED_DURATIONS.contains(&secs) {
            Ok(Self(secs))
        } else {
            Err(Error::UnsupportedDuration(secs))
        }
    }
}

impl From<TestDuration> for u64 {
    fn from(d: TestDuration) -> Self {
        d.0
    }
}

impl FromStr for TestDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let secs = s
            .trim()
            .trim_end_matches('s')
            .parse::<u64>()
            .map_err(|e| format!("invalid duration {s:?}: {e}"))?;
        TestDuration::try_from(secs).map_err(|e| e.to_string())
    }
}

impl fmt::Display for TestDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

/// What a single tick did to the clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockTick {
    /// Clock not running or already at zero
    Idle,
    /// One second counted off; carries the seconds left
    Counted(u64),
    /// This tick brought the clock to zero
    Expired,
}

/// Countdown clock for one attempt, advanced by one-second ticks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClock {
    total_secs: u64,
    remaining_secs: u64,
    running: bool,
}

impl SessionClock {
    pub fn new(total_secs: u64) -> Self {
        Self {
            total_secs,
            remaining_secs: total_secs,
            running: false,
        }
    }

    pub fn start(&mut self) {
        if !self.running {
            self.running = true;
        }
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn reset(&mut self, total_secs: u64) {
        self.total_secs = total_secs;
        self.remaining_secs = total_secs;
        self.running = false;
    }

    pub fn tick(&mut self) -> ClockTick {
        if !self.running || self.remaining_secs == 0 {
            return ClockTick::Idle;
        }

        self.remaining_secs -= 1;
        if self.remaining_secs == 0 {
            self.running = false;
            ClockTick::Expired
        } else {
            ClockTick::Counted(self.remaining_secs)
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_expired(&self) -> bool {
        self.remaining_secs == 0
    }

    pub fn total_secs(&self) -> u64 {
        self.total_secs
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.total_secs - self.remaining_secs
    }
}
