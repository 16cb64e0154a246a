//! Common types shared between the engine and its transports.

use serde::{Serialize, Serializer};
use std::time::Duration;

/// One generated sample, as handed to a streaming transport.
///
/// The transport layer serializes events to JSON verbatim; the `timestamp`
/// field is encoded as fractional seconds since session start.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    /// Signal name (e.g. "heart_rate")
    pub signal: String,
    /// Sampled value
    pub value: f64,
    /// Display unit (e.g. "bpm"); carries no computational meaning
    pub unit: String,
    /// Name of the phase active when the sample was due ("" outside phases)
    pub phase: String,
    /// Time since session start at which this sample was due
    #[serde(serialize_with = "serialize_secs")]
    pub timestamp: Duration,
}

fn serialize_secs<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}
