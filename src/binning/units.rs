//! Human-readable byte and time units.
//!
//! Both are fixed threshold ladders: one unit is picked for a whole chart
//! or value, never per cell.

use serde::{Deserialize, Serialize};
use std::fmt;

const KIB: f64 = 1024.0;

/// Binary-multiple byte unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ByteUnit {
    B,
    KB,
    MB,
    GB,
    TB,
}

impl ByteUnit {
    const LADDER: [ByteUnit; 5] = [Self::B, Self::KB, Self::MB, Self::GB, Self::TB];

    /// Largest unit for which `value` stays at or above 1 (B below 1 KB)
    pub fn for_value(value: f64) -> Self {
        let mut unit = Self::B;
        for next in Self::LADDER.iter().skip(1) {
            if value < next.divisor() {
                break;
            }
            unit = *next;
        }
        unit
    }

    pub fn divisor(&self) -> f64 {
        match self {
            Self::B => 1.0,
            Self::KB => KIB,
            Self::MB => KIB * KIB,
            Self::GB => KIB * KIB * KIB,
            Self::TB => KIB * KIB * KIB * KIB,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::B => "B",
            Self::KB => "KB",
            Self::MB => "MB",
            Self::GB => "GB",
            Self::TB => "TB",
        }
    }

    pub fn scale(&self, value: f64) -> f64 {
        value / self.divisor()
    }
}

impl fmt::Display for ByteUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Time axis unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeUnit {
    Seconds,
    Milliseconds,
    Microseconds,
    Nanoseconds,
}

impl TimeUnit {
    /// Pick a unit from the largest value on the axis, in seconds
    pub fn for_seconds(max_seconds: f64) -> Self {
        if max_seconds >= 1.0 {
            Self::Seconds
        } else if max_seconds >= 1e-3 {
            Self::Milliseconds
        } else if max_seconds >= 1e-6 {
            Self::Microseconds
        } else {
            Self::Nanoseconds
        }
    }

    /// Seconds per unit
    pub fn divisor(&self) -> f64 {
        match self {
            Self::Seconds => 1.0,
            Self::Milliseconds => 1e-3,
            Self::Microseconds => 1e-6,
            Self::Nanoseconds => 1e-9,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Seconds => "s",
            Self::Milliseconds => "ms",
            Self::Microseconds => "μs",
            Self::Nanoseconds => "ns",
        }
    }

    /// Decimal places used for axis tick labels
    pub fn decimals(&self) -> usize {
        match self {
            Self::Seconds => 2,
            Self::Milliseconds | Self::Microseconds => 1,
            Self::Nanoseconds => 0,
        }
    }

    pub fn scale(&self, seconds: f64) -> f64 {
        seconds / self.divisor()
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Format a byte amount with two decimals, e.g. `15.00 KB`
pub fn format_bytes(bytes: f64) -> String {
    let unit = ByteUnit::for_value(bytes);
    format!("{:.2} {}", unit.scale(bytes), unit)
}

/// Format a duration in seconds with its own unit, e.g. `1.5 ms`
pub fn format_duration(seconds: f64) -> String {
    let unit = TimeUnit::for_seconds(seconds);
    format!(
        "{:.*} {}",
        unit.decimals(),
        unit.scale(seconds),
        unit.label()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes_ladder() {
        assert_eq!(format_bytes(0.0), "0.00 B");
        assert_eq!(format_bytes(1023.0), "1023.00 B");
        assert_eq!(format_bytes(1024.0), "1.00 KB");
        assert_eq!(format_bytes(15360.0), "15.00 KB");
        assert_eq!(format_bytes(5.0 * 1024.0 * 1024.0), "5.00 MB");
        assert_eq!(format_bytes(2048.0 * KIB * KIB * KIB * KIB), "2048.00 TB");
    }

    #[test]
    fn test_time_unit_thresholds() {
        assert_eq!(TimeUnit::for_seconds(1.0), TimeUnit::Seconds);
        assert_eq!(TimeUnit::for_seconds(0.999), TimeUnit::Milliseconds);
        assert_eq!(TimeUnit::for_seconds(0.001), TimeUnit::Milliseconds);
        assert_eq!(TimeUnit::for_seconds(0.0000015), TimeUnit::Microseconds);
        assert_eq!(TimeUnit::for_seconds(0.0), TimeUnit::Nanoseconds);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(2.5), "2.50 s");
        assert_eq!(format_duration(0.0015), "1.5 ms");
        assert_eq!(format_duration(0.0), "0 ns");
    }
}
