//! Scenario definition model.
//!
//! A scenario is a declarative description of the signals a virtual device
//! produces and the phases that reshape them over time. Definitions are
//! parsed from YAML, validated once at load, and immutable afterwards.
//!
//! ## Example Definition
//!
//! ```yaml
//! name: workout
//! description: Interval training session
//! duration: 20m
//! default_rate: 1/s
//! signals:
//!   heart_rate:
//!     baseline: [65, 75]
//!     noise: { kind: gaussian, amplitude: 2.0 }
//!     rate: 1/s
//!     unit: bpm
//! phases:
//!   - name: warmup
//!     duration: 3m
//!     overrides:
//!       heart_rate: { add: 25 }
//! ```

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use synheart_core::units::{SignalRate, Span};

/// Baseline for a signal: a fixed value, or a `[min, max]` range from which
/// a stable per-session value is drawn once at session start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Baseline {
    Fixed(f64),
    Range([f64; 2]),
}

impl Baseline {
    pub fn is_range(&self) -> bool {
        matches!(self, Baseline::Range(_))
    }
}

/// Noise shape applied per sample on top of the resolved baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseKind {
    /// Jitter drawn uniformly from `[-amplitude, +amplitude]`
    Uniform,
    /// Zero-mean gaussian with `amplitude` as standard deviation
    Gaussian,
}

impl Default for NoiseKind {
    fn default() -> Self {
        NoiseKind::Uniform
    }
}

/// Noise descriptor. A bare number is shorthand for uniform jitter with
/// that amplitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NoiseConfig {
    Amplitude(f64),
    Shaped(NoiseShape),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseShape {
    #[serde(default)]
    pub kind: NoiseKind,
    pub amplitude: f64,
}

impl NoiseConfig {
    pub fn kind(&self) -> NoiseKind {
        match self {
            NoiseConfig::Amplitude(_) => NoiseKind::Uniform,
            NoiseConfig::Shaped(shape) => shape.kind,
        }
    }

    pub fn amplitude(&self) -> f64 {
        match self {
            NoiseConfig::Amplitude(a) => *a,
            NoiseConfig::Shaped(shape) => shape.amplitude,
        }
    }
}

/// One tracked quantity within a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalConfig {
    /// Baseline value or range
    pub baseline: Baseline,
    /// Optional per-sample noise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noise: Option<NoiseConfig>,
    /// Sampling frequency; must be strictly positive
    pub rate: SignalRate,
    /// Display unit, no computational effect
    #[serde(default)]
    pub unit: String,
}

/// A patch applied to one signal for the duration of a phase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Override {
    /// Additive delta on the resolved baseline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add: Option<f64>,
    /// Multiplicative factor, applied after `add`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiply: Option<f64>,
    /// Fixed replacement value; wins over everything, noise-exempt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// Wholesale baseline replacement for the phase
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline: Option<Baseline>,
    /// Wholesale noise replacement for the phase
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noise: Option<NoiseConfig>,
}

/// A time-boxed modification window.
///
/// A phase's overrides engage once its cumulative end time is reached and
/// hold until the next phase completes. A missing or zero duration is only
/// meaningful on the last phase: it engages at its start and holds until
/// the session ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    /// Label, not required to be unique
    pub name: String,
    /// Time span; None or zero on the last phase means open-ended
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Span>,
    /// Per-signal patches
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: BTreeMap<String, Override>,
}

impl Phase {
    /// True when this phase has no bounded duration.
    pub fn is_open_ended(&self) -> bool {
        match self.duration {
            None => true,
            Some(span) => span.is_zero(),
        }
    }
}

/// Root scenario definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Unique name within a registry
    pub name: String,
    /// Human description, shown by list/describe surfaces
    #[serde(default)]
    pub description: String,
    /// Total advertised runtime; None means open-ended
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Span>,
    /// Fallback rate suggestion for transports
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_rate: Option<SignalRate>,
    /// Signals keyed by name
    pub signals: BTreeMap<String, SignalConfig>,
    /// Phases in playback order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phases: Vec<Phase>,
}

impl Scenario {
    /// Parse a single YAML document and validate it.
    pub fn parse(source: &str, origin: &str) -> EngineResult<Self> {
        let scenario: Scenario = serde_yaml::from_str(source).map_err(|e| EngineError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Sum of explicit phase durations. None when any phase is open-ended.
    pub fn total_phase_time(&self) -> Option<Duration> {
        let mut total = Duration::ZERO;
        for phase in &self.phases {
            total += phase.duration?.as_duration();
        }
        Some(total)
    }

    /// Whether playback ever self-completes.
    pub fn is_open_ended(&self) -> bool {
        self.duration.is_none()
    }

    /// Check every invariant the loader relies on. Called by the registry
    /// for each definition; safe to call again on an already-loaded value.
    pub fn validate(&self) -> EngineResult<()> {
        if self.name.trim().is_empty() {
            return Err(EngineError::validation(
                "<unnamed>",
                "name",
                "must not be empty",
            ));
        }

        for (name, signal) in &self.signals {
            if name.trim().is_empty() {
                return Err(EngineError::validation(
                    &self.name,
                    "signals",
                    "signal name must not be empty",
                ));
            }
            if !(signal.rate.hz() > 0.0) {
                return Err(EngineError::validation(
                    &self.name,
                    format!("signals.{}.rate", name),
                    format!("must be > 0, got {}", signal.rate.hz()),
                ));
            }
            validate_baseline(&self.name, &format!("signals.{}.baseline", name), &signal.baseline)?;
            if let Some(noise) = &signal.noise {
                validate_noise(&self.name, &format!("signals.{}.noise", name), noise)?;
            }
        }

        let last = self.phases.len().saturating_sub(1);
        for (i, phase) in self.phases.iter().enumerate() {
            if phase.duration.is_none() && i != last {
                return Err(EngineError::validation(
                    &self.name,
                    format!("phases[{}].duration", i),
                    "only the last phase may omit its duration",
                ));
            }
            for (signal, patch) in &phase.overrides {
                if !self.signals.contains_key(signal) {
                    return Err(EngineError::validation(
                        &self.name,
                        format!("phases[{}].overrides.{}", i, signal),
                        format!("references unknown signal '{}'", signal),
                    ));
                }
                if let Some(baseline) = &patch.baseline {
                    validate_baseline(
                        &self.name,
                        &format!("phases[{}].overrides.{}.baseline", i, signal),
                        baseline,
                    )?;
                }
                if let Some(noise) = &patch.noise {
                    validate_noise(
                        &self.name,
                        &format!("phases[{}].overrides.{}.noise", i, signal),
                        noise,
                    )?;
                }
            }
        }

        if let (Some(total), Some(phase_time)) = (self.duration, self.total_phase_time()) {
            if phase_time > total.as_duration() {
                return Err(EngineError::validation(
                    &self.name,
                    "phases",
                    format!(
                        "phase durations sum to {:?}, exceeding scenario duration {:?}",
                        phase_time,
                        total.as_duration()
                    ),
                ));
            }
        }

        Ok(())
    }
}

fn validate_baseline(scenario: &str, field: &str, baseline: &Baseline) -> EngineResult<()> {
    match baseline {
        Baseline::Fixed(v) => {
            if !v.is_finite() {
                return Err(EngineError::validation(scenario, field, "must be finite"));
            }
        }
        Baseline::Range([min, max]) => {
            if !min.is_finite() || !max.is_finite() {
                return Err(EngineError::validation(scenario, field, "must be finite"));
            }
            if min > max {
                return Err(EngineError::validation(
                    scenario,
                    field,
                    format!("range min {} exceeds max {}", min, max),
                ));
            }
        }
    }
    Ok(())
}

fn validate_noise(scenario: &str, field: &str, noise: &NoiseConfig) -> EngineResult<()> {
    let amplitude = noise.amplitude();
    if !amplitude.is_finite() || amplitude < 0.0 {
        return Err(EngineError::validation(
            scenario,
            field,
            format!("amplitude must be >= 0, got {}", amplitude),
        ));
    }
    Ok(())
}
