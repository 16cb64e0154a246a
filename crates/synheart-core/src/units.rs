//! Duration and rate values as they appear in scenario files.
//!
//! Scenario authors write durations as either bare seconds (`90`) or human
//! strings (`"90s"`, `"5m"`, `"1h30m"`, `"250ms"`), and sampling rates as
//! either bare Hz (`0.5`) or `"N/unit"` strings (`"1/s"`, `"30/m"`). Both
//! forms deserialize to the same value; serialization always emits the
//! string form.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// A non-negative time span parsed from a scenario file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span(Duration);

impl Span {
    pub const ZERO: Span = Span(Duration::ZERO);

    /// Build from fractional seconds. Rejects negative or non-finite input.
    pub fn from_secs_f64(secs: f64) -> Result<Self, String> {
        if !secs.is_finite() {
            return Err(format!("duration must be finite, got {}", secs));
        }
        if secs < 0.0 {
            return Err(format!("duration must be non-negative, got {}", secs));
        }
        Ok(Span(Duration::from_secs_f64(secs)))
    }

    pub const fn from_duration(d: Duration) -> Self {
        Span(d)
    }

    #[inline]
    pub const fn as_duration(&self) -> Duration {
        self.0
    }

    #[inline]
    pub fn as_secs_f64(&self) -> f64 {
        self.0.as_secs_f64()
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl From<Duration> for Span {
    fn from(d: Duration) -> Self {
        Span(d)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_zero() {
            return write!(f, "0s");
        }
        if self.0.subsec_nanos() != 0 {
            // Fractional spans: millisecond form below one second,
            // fractional seconds otherwise.
            if self.0 < Duration::from_secs(1) {
                return write!(f, "{}ms", self.0.as_secs_f64() * 1e3);
            }
            return write!(f, "{}s", self.0.as_secs_f64());
        }
        let total = self.0.as_secs();
        let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
        if h > 0 {
            write!(f, "{}h", h)?;
        }
        if m > 0 {
            write!(f, "{}m", m)?;
        }
        if s > 0 || (h == 0 && m == 0) {
            write!(f, "{}s", s)?;
        }
        Ok(())
    }
}

impl FromStr for Span {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_span(s).map(Span)
    }
}

impl Serialize for Span {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Span {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Seconds(f64),
            Text(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Seconds(secs) => Span::from_secs_f64(secs).map_err(D::Error::custom),
            Raw::Text(text) => text.parse().map_err(D::Error::custom),
        }
    }
}

/// Parse a duration string: one or more `<number><unit>` segments where the
/// unit is `ms`, `s`, `m`/`min`, or `h`. A single bare number is seconds.
fn parse_span(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("empty duration".to_string());
    }

    // Bare number: seconds.
    if let Ok(secs) = input.parse::<f64>() {
        return Span::from_secs_f64(secs).map(|s| s.0);
    }

    let mut total = Duration::ZERO;
    let mut rest = input;
    while !rest.is_empty() {
        let num_end = rest
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .ok_or_else(|| format!("missing unit in duration '{}'", input))?;
        if num_end == 0 {
            return Err(format!("expected number in duration '{}'", input));
        }
        let value: f64 = rest[..num_end]
            .parse()
            .map_err(|_| format!("bad number '{}' in duration '{}'", &rest[..num_end], input))?;
        rest = &rest[num_end..];
        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let factor = match &rest[..unit_end] {
            "ms" => 1e-3,
            "s" => 1.0,
            "m" | "min" => 60.0,
            "h" => 3600.0,
            unit => return Err(format!("unknown duration unit '{}' in '{}'", unit, input)),
        };
        rest = &rest[unit_end..];
        total += Duration::from_secs_f64(value * factor);
    }
    Ok(total)
}

/// A sampling frequency in samples per second.
///
/// Validation of strict positivity happens at scenario load; the parser only
/// rejects values it cannot represent (negative, non-finite).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct SignalRate(f64);

impl SignalRate {
    pub fn from_hz(hz: f64) -> Result<Self, String> {
        if !hz.is_finite() {
            return Err(format!("rate must be finite, got {}", hz));
        }
        if hz < 0.0 {
            return Err(format!("rate must be non-negative, got {}", hz));
        }
        Ok(SignalRate(hz))
    }

    #[inline]
    pub fn hz(&self) -> f64 {
        self.0
    }

    /// Interval between consecutive samples. Callers must ensure the rate is
    /// strictly positive first.
    #[inline]
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.0)
    }
}

impl fmt::Display for SignalRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/s", self.0)
    }
}

impl FromStr for SignalRate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (count, per) = match s.split_once('/') {
            Some((count, per)) => (count, per),
            // Bare number: Hz.
            None => {
                let hz: f64 = s.parse().map_err(|_| format!("bad rate '{}'", s))?;
                return SignalRate::from_hz(hz);
            }
        };
        let count: f64 = count
            .trim()
            .parse()
            .map_err(|_| format!("bad rate '{}'", s))?;
        let divisor = match per.trim() {
            "s" | "sec" => 1.0,
            "m" | "min" => 60.0,
            "h" => 3600.0,
            unit => return Err(format!("unknown rate unit '{}' in '{}'", unit, s)),
        };
        SignalRate::from_hz(count / divisor)
    }
}

impl Serialize for SignalRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for SignalRate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Hz(f64),
            Text(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Hz(hz) => SignalRate::from_hz(hz).map_err(D::Error::custom),
            Raw::Text(text) => text.parse().map_err(D::Error::custom),
        }
    }
}
