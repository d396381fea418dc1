use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Time unit a stored duration can be read in.
///
/// Durations are kept in nanoseconds; every conversion truncates toward zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    pub const ALL: [TimeUnit; 7] = [
        TimeUnit::Nanoseconds,
        TimeUnit::Microseconds,
        TimeUnit::Milliseconds,
        TimeUnit::Seconds,
        TimeUnit::Minutes,
        TimeUnit::Hours,
        TimeUnit::Days,
    ];

    /// Number of nanoseconds in one of this unit.
    pub const fn nanos_per_unit(self) -> u64 {
        match self {
            TimeUnit::Nanoseconds => 1,
            TimeUnit::Microseconds => 1_000,
            TimeUnit::Milliseconds => 1_000_000,
            TimeUnit::Seconds => 1_000_000_000,
            TimeUnit::Minutes => 60 * 1_000_000_000,
            TimeUnit::Hours => 60 * 60 * 1_000_000_000,
            TimeUnit::Days => 24 * 60 * 60 * 1_000_000_000,
        }
    }

    pub const fn convert_from_nanos(self, nanos: u64) -> u64 {
        nanos / self.nanos_per_unit()
    }

    /// Inverse of [`convert_from_nanos`](Self::convert_from_nanos), saturating on overflow.
    pub const fn to_nanos(self, value: u64) -> u64 {
        value.saturating_mul(self.nanos_per_unit())
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            TimeUnit::Nanoseconds => "nanoseconds",
            TimeUnit::Microseconds => "microseconds",
            TimeUnit::Milliseconds => "milliseconds",
            TimeUnit::Seconds => "seconds",
            TimeUnit::Minutes => "minutes",
            TimeUnit::Hours => "hours",
            TimeUnit::Days => "days",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unit = match s.trim().to_ascii_lowercase().as_str() {
            "ns" | "nanos" | "nanoseconds" => TimeUnit::Nanoseconds,
            "us" | "µs" | "micros" | "microseconds" => TimeUnit::Microseconds,
            "ms" | "millis" | "milliseconds" => TimeUnit::Milliseconds,
            "s" | "secs" | "seconds" => TimeUnit::Seconds,
            "m" | "min" | "minutes" => TimeUnit::Minutes,
            "h" | "hours" => TimeUnit::Hours,
            "d" | "days" => TimeUnit::Days,
            _ => return Err(Error::UnknownTimeUnit(s.to_string())),
        };
        Ok(unit)
    }
}
