//! Phase scheduling: which phase is playing, and which overrides are in
//! effect, at a given elapsed time.
//!
//! The schedule is pure: the same `(scenario, t)` always resolves to the
//! same answer, which is what makes demos reproducible and lets tests run
//! without a real clock.
//!
//! ## Timeline model
//!
//! Phase windows are laid out by prefix-summing durations; phase `i` plays
//! during `[start_i, start_i + d_i)` and the reported phase index clamps to
//! the last phase once `t` passes the end. A phase's *overrides*, however,
//! engage when that phase completes (its cumulative end time) and stay in
//! effect until the next phase completes:
//!
//! ```text
//! t:        0 ......... d0 ......... d0+d1 ............
//! playing:  [ phase 0   )[ phase 1   )[ hold last      ]
//! in effect: base        phase 0      phase 1 overrides
//! ```
//!
//! An open-ended (zero/absent duration) last phase engages the moment its
//! window starts. Before the first phase completes, the base configuration
//! is in effect.

use crate::scenario::definition::{NoiseConfig, Phase, Scenario};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Per-session resolved baselines for every range-valued baseline in a
/// scenario. Fixed baselines are resolved too so lookup is uniform.
#[derive(Debug, Clone, Default)]
pub struct ResolvedBaselines {
    /// Signal name -> resolved base value
    pub base: BTreeMap<String, f64>,
    /// (phase index, signal name) -> resolved override baseline
    pub phase: BTreeMap<(usize, String), f64>,
}

/// Fully resolved configuration for one signal at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectiveSignal {
    /// Fixed replacement value; when set, noise and baseline are ignored
    pub fixed: Option<f64>,
    /// Resolved numeric baseline with add/multiply applied
    pub baseline: f64,
    /// Noise in effect (base or phase replacement)
    pub noise: Option<NoiseConfig>,
    /// Sampling rate in Hz (never overridden by phases)
    pub rate: f64,
}

/// Precomputed phase timeline for one scenario.
pub struct PhaseSchedule {
    scenario: Arc<Scenario>,
    /// Window start per phase (prefix sums)
    starts: Vec<Duration>,
    /// Cumulative end per phase; None for an open-ended last phase
    ends: Vec<Option<Duration>>,
    /// Full cycle length, when every phase is bounded and nonzero
    cycle: Option<Duration>,
}

impl PhaseSchedule {
    pub fn new(scenario: Arc<Scenario>) -> Self {
        let mut starts = Vec::with_capacity(scenario.phases.len());
        let mut ends = Vec::with_capacity(scenario.phases.len());
        let mut cursor = Duration::ZERO;
        for phase in &scenario.phases {
            starts.push(cursor);
            match phase.duration {
                Some(span) if !span.is_zero() => {
                    cursor += span.as_duration();
                    ends.push(Some(cursor));
                }
                // Zero or absent duration: completes the instant it starts.
                _ => ends.push(Some(cursor)),
            }
        }
        let open_ended = scenario.phases.last().map(Phase::is_open_ended);
        if open_ended == Some(true) {
            if let Some(last) = ends.last_mut() {
                *last = None;
            }
        }
        let cycle = match (scenario.phases.is_empty(), open_ended) {
            (false, Some(false)) if cursor > Duration::ZERO => Some(cursor),
            _ => None,
        };
        Self {
            scenario,
            starts,
            ends,
            cycle,
        }
    }

    pub fn scenario(&self) -> &Arc<Scenario> {
        &self.scenario
    }

    /// Cycle length for looped playback; None when the scenario cannot loop
    /// (no phases, or an open-ended last phase).
    pub fn cycle(&self) -> Option<Duration> {
        self.cycle
    }

    /// Index of the phase whose window contains `t`, clamped to the last
    /// phase once `t` passes the end of the timeline. None without phases.
    pub fn phase_at(&self, t: Duration) -> Option<usize> {
        if self.starts.is_empty() {
            return None;
        }
        for (i, start) in self.starts.iter().enumerate() {
            let within = match self.ends[i] {
                Some(end) => t >= *start && t < end,
                None => t >= *start,
            };
            if within {
                return Some(i);
            }
        }
        Some(self.starts.len() - 1)
    }

    /// Name of the phase playing at `t`, or "" without phases.
    pub fn phase_name_at(&self, t: Duration) -> &str {
        match self.phase_at(t) {
            Some(i) => &self.scenario.phases[i].name,
            None => "",
        }
    }

    /// Index of the phase whose overrides are in effect at `t`: the last
    /// phase that has completed (open-ended phases engage at their start).
    /// None while the base configuration still applies.
    pub fn engaged_at(&self, t: Duration) -> Option<usize> {
        let mut engaged = None;
        for (i, start) in self.starts.iter().enumerate() {
            let done = match self.ends[i] {
                Some(end) => t >= end,
                None => t >= *start,
            };
            if done {
                engaged = Some(i);
            }
        }
        engaged
    }

    /// Resolve the effective configuration for `signal` at `t`.
    ///
    /// `baselines` supplies the per-session values drawn for range-valued
    /// baselines; the schedule itself stays deterministic and stateless.
    /// Returns None for a signal the scenario does not define.
    pub fn effective(
        &self,
        signal: &str,
        t: Duration,
        baselines: &ResolvedBaselines,
    ) -> Option<EffectiveSignal> {
        let config = self.scenario.signals.get(signal)?;
        let mut effective = EffectiveSignal {
            fixed: None,
            baseline: baselines.base.get(signal).copied().unwrap_or(0.0),
            noise: config.noise,
            rate: config.rate.hz(),
        };

        if let Some(idx) = self.engaged_at(t) {
            if let Some(patch) = self.scenario.phases[idx].overrides.get(signal) {
                if patch.baseline.is_some() {
                    if let Some(&value) = baselines.phase.get(&(idx, signal.to_string())) {
                        effective.baseline = value;
                    }
                }
                if let Some(noise) = patch.noise {
                    effective.noise = Some(noise);
                }
                if let Some(add) = patch.add {
                    effective.baseline += add;
                }
                if let Some(multiply) = patch.multiply {
                    effective.baseline *= multiply;
                }
                if let Some(value) = patch.value {
                    effective.fixed = Some(value);
                }
            }
        }

        Some(effective)
    }
}
