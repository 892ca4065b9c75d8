//! Common types shared across the crates.

use std::fmt;
use std::iter::Sum;

use serde::{Deserialize, Serialize};

/// Duration in whole seconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
#[serde(transparent)]
pub struct Duration(pub u64);

impl Duration {
    pub const ZERO: Self = Self(0);

    pub const fn from_seconds(seconds: u64) -> Self {
        Self(seconds)
    }

    /// Build from fractional seconds as reported by extractors.
    /// Negative and non-finite values collapse to zero.
    pub fn from_secs_f64(seconds: f64) -> Self {
        if seconds.is_finite() && seconds > 0.0 {
            Self(seconds.round() as u64)
        } else {
            Self::ZERO
        }
    }

    pub const fn as_seconds(&self) -> u64 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Format as MM:SS or HH:MM:SS.
    pub fn format(&self) -> String {
        let total_secs = self.0;
        let hours = total_secs / 3600;
        let minutes = (total_secs % 3600) / 60;
        let seconds = total_secs % 60;

        if hours > 0 {
            format!("{hours}:{minutes:02}:{seconds:02}")
        } else {
            format!("{minutes}:{seconds:02}")
        }
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

impl From<u64> for Duration {
    fn from(seconds: u64) -> Self {
        Self(seconds)
    }
}

impl From<Duration> for std::time::Duration {
    fn from(d: Duration) -> Self {
        Self::from_secs(d.0)
    }
}

impl Sum for Duration {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.map(|d| d.0).fold(0, u64::saturating_add))
    }
}
