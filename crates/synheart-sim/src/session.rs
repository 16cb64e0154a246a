//! Generation sessions.
//!
//! A [`GenerationSession`] is one live playback of a scenario for a single
//! consumer. It owns all mutable playback state: elapsed time, the per-signal
//! next-due timestamps, the per-session resolved baselines, and the seeded
//! samplers. Sessions share nothing with each other; the scenario definition
//! they read from is immutable.
//!
//! The session is tick-driven: the surrounding transport (or a test) calls
//! [`GenerationSession::tick`] with the elapsed time and receives every
//! sample that came due since the previous tick, in timestamp order.

use crate::error::{EngineError, EngineResult};
use crate::scenario::definition::Scenario;
use crate::scenario::sampler::{draw_baseline, derive_seed, SeedStream, SignalSampler};
use crate::scenario::schedule::{PhaseSchedule, ResolvedBaselines};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use synheart_core::Event;
use tracing::debug;

/// Session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Constructed, baselines drawn, no tick seen yet
    Created,
    /// At least one tick processed
    Running,
    /// Elapsed time passed the scenario's declared duration
    Completed,
    /// Stopped by the consumer, or failed at runtime
    Cancelled,
}

/// Playback options supplied by the consumer.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Explicit seed for reproducible streams; None draws a fresh one
    pub seed: Option<u64>,
    /// Playback speed multiplier applied by the runner (1.0 = real time)
    pub speed: f64,
    /// Repeat the phase timeline instead of holding the final state.
    /// Only honored when every phase has a bounded, nonzero duration.
    pub loop_playback: bool,
    /// Pacing interval for the runner's tick loop
    pub tick_interval: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            seed: None,
            speed: 1.0,
            loop_playback: false,
            tick_interval: Duration::from_millis(100),
        }
    }
}

impl SessionOptions {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Default::default()
        }
    }
}

struct SignalSlot {
    sampler: SignalSampler,
    next_due: Duration,
    period: Duration,
    unit: String,
}

/// One running instance of a scenario.
pub struct GenerationSession {
    scenario: Arc<Scenario>,
    schedule: PhaseSchedule,
    baselines: ResolvedBaselines,
    slots: BTreeMap<String, SignalSlot>,
    state: SessionState,
    elapsed: Duration,
    seed: u64,
    loop_playback: bool,
}

impl GenerationSession {
    /// Construct a session and draw its per-session baselines.
    ///
    /// Range-valued baselines (base and phase overrides alike) are resolved
    /// here, once, from a seed stream separate from the noise streams so
    /// they cannot perturb sample noise.
    pub fn new(scenario: Arc<Scenario>, options: &SessionOptions) -> EngineResult<Self> {
        let seed = options.seed.unwrap_or_else(rand::random);

        let mut baselines = ResolvedBaselines::default();
        let mut baseline_rng = StdRng::seed_from_u64(derive_seed(
            seed,
            &scenario.name,
            "",
            SeedStream::Baseline,
        ));
        for (name, config) in &scenario.signals {
            baselines
                .base
                .insert(name.clone(), draw_baseline(&mut baseline_rng, &config.baseline));
        }
        for (idx, phase) in scenario.phases.iter().enumerate() {
            for (name, patch) in &phase.overrides {
                if let Some(baseline) = &patch.baseline {
                    baselines
                        .phase
                        .insert((idx, name.clone()), draw_baseline(&mut baseline_rng, baseline));
                }
            }
        }

        let mut slots = BTreeMap::new();
        for (name, config) in &scenario.signals {
            let hz = config.rate.hz();
            if !(hz > 0.0) || !hz.is_finite() {
                return Err(EngineError::Runtime(format!(
                    "signal '{}' has unusable rate {}",
                    name, hz
                )));
            }
            slots.insert(
                name.clone(),
                SignalSlot {
                    sampler: SignalSampler::new(seed, &scenario.name, name),
                    next_due: Duration::ZERO,
                    period: config.rate.period(),
                    unit: config.unit.clone(),
                },
            );
        }

        debug!(scenario = %scenario.name, seed, "session created");

        Ok(Self {
            schedule: PhaseSchedule::new(scenario.clone()),
            scenario,
            baselines,
            slots,
            state: SessionState::Created,
            elapsed: Duration::ZERO,
            seed,
            loop_playback: options.loop_playback,
        })
    }

    pub fn scenario_name(&self) -> &str {
        &self.scenario.name
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// The seed this session runs with (drawn at construction when the
    /// consumer gave none).
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, SessionState::Completed | SessionState::Cancelled)
    }

    /// Advance the session to `elapsed` and collect every sample that came
    /// due, sorted by `(timestamp, signal)`.
    ///
    /// Ticks are expected in nondecreasing order; a tick behind the current
    /// elapsed time yields no events. Finished sessions always yield no
    /// events. A configuration problem discovered mid-playback terminates
    /// this session only.
    pub fn tick(&mut self, elapsed: Duration) -> EngineResult<Vec<Event>> {
        match self.state {
            SessionState::Completed | SessionState::Cancelled => return Ok(Vec::new()),
            SessionState::Created => self.state = SessionState::Running,
            SessionState::Running => {}
        }
        if elapsed < self.elapsed {
            return Ok(Vec::new());
        }
        self.elapsed = elapsed;

        // Samples due past the declared end are never emitted; the one at
        // exactly the end still is.
        let limit = match self.scenario.duration {
            Some(total) if total.as_duration() < elapsed => total.as_duration(),
            _ => elapsed,
        };

        let cycle = if self.loop_playback {
            self.schedule.cycle()
        } else {
            None
        };

        let mut events = Vec::new();
        for (name, slot) in &mut self.slots {
            while slot.next_due <= limit {
                let due = slot.next_due;
                let schedule_t = wrap_time(due, cycle);
                let effective = self
                    .schedule
                    .effective(name, schedule_t, &self.baselines)
                    .ok_or_else(|| {
                        EngineError::Runtime(format!("signal '{}' vanished from scenario", name))
                    });
                let effective = match effective {
                    Ok(effective) => effective,
                    Err(e) => {
                        self.state = SessionState::Cancelled;
                        return Err(e);
                    }
                };
                events.push(Event {
                    signal: name.clone(),
                    value: slot.sampler.sample(&effective),
                    unit: slot.unit.clone(),
                    phase: self.schedule.phase_name_at(schedule_t).to_string(),
                    timestamp: due,
                });
                slot.next_due += slot.period;
            }
        }

        events.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.signal.cmp(&b.signal))
        });

        if let Some(total) = self.scenario.duration {
            if elapsed > total.as_duration() {
                debug!(scenario = %self.scenario.name, "session completed");
                self.state = SessionState::Completed;
            }
        }

        Ok(events)
    }

    /// Stop producing events. Idempotent; a completed session stays
    /// completed.
    pub fn cancel(&mut self) {
        if self.state != SessionState::Completed {
            self.state = SessionState::Cancelled;
        }
    }
}

/// Map a due time onto the phase timeline, wrapping modulo the cycle when
/// looped playback is active.
fn wrap_time(t: Duration, cycle: Option<Duration>) -> Duration {
    match cycle {
        Some(cycle) if !cycle.is_zero() => {
            let nanos = t.as_nanos() % cycle.as_nanos();
            Duration::new((nanos / 1_000_000_000) as u64, (nanos % 1_000_000_000) as u32)
        }
        _ => t,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::definition::Scenario;

    fn scenario(yaml: &str) -> Arc<Scenario> {
        Arc::new(Scenario::parse(yaml, "test.yaml").unwrap())
    }

    fn seeded(seed: u64) -> SessionOptions {
        SessionOptions::with_seed(seed)
    }

    const HR_WITH_PHASE: &str = r#"
name: hr_phase
duration: 60s
signals:
  hr:
    baseline: 70
    rate: 1/s
    unit: bpm
phases:
  - name: elevate
    duration: 5s
    overrides:
      hr: { add: 20 }
"#;

    #[test]
    fn test_phase_boundary_end_to_end() {
        let mut session = GenerationSession::new(scenario(HR_WITH_PHASE), &seeded(1)).unwrap();
        let mut values = Vec::new();
        for secs in 0..=6 {
            let events = session.tick(Duration::from_secs(secs)).unwrap();
            assert_eq!(events.len(), 1, "one hr sample per second");
            values.push(events[0].value);
        }
        assert_eq!(values, vec![70.0, 70.0, 70.0, 70.0, 70.0, 90.0, 90.0]);
    }

    #[test]
    fn test_event_fields() {
        let mut session = GenerationSession::new(scenario(HR_WITH_PHASE), &seeded(1)).unwrap();
        let events = session.tick(Duration::ZERO).unwrap();
        let event = &events[0];
        assert_eq!(event.signal, "hr");
        assert_eq!(event.unit, "bpm");
        assert_eq!(event.phase, "elevate");
        assert_eq!(event.timestamp, Duration::ZERO);
    }

    #[test]
    fn test_catch_up_tick_emits_backlog() {
        let mut session = GenerationSession::new(scenario(HR_WITH_PHASE), &seeded(1)).unwrap();
        let events = session.tick(Duration::from_secs(3)).unwrap();
        let stamps: Vec<u64> = events.iter().map(|e| e.timestamp.as_secs()).collect();
        assert_eq!(stamps, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_independent_signal_rates() {
        let yaml = r#"
name: rates
signals:
  fast:
    baseline: 1
    rate: 2/s
  slow:
    baseline: 2
    rate: 0.5/s
"#;
        let mut session = GenerationSession::new(scenario(yaml), &seeded(1)).unwrap();
        let events = session.tick(Duration::from_secs(2)).unwrap();
        let fast = events.iter().filter(|e| e.signal == "fast").count();
        let slow = events.iter().filter(|e| e.signal == "slow").count();
        // fast due at 0, 0.5, 1, 1.5, 2; slow due at 0, 2.
        assert_eq!(fast, 5);
        assert_eq!(slow, 2);

        // Interleaved in timestamp order.
        let mut last = Duration::ZERO;
        for event in &events {
            assert!(event.timestamp >= last);
            last = event.timestamp;
        }
    }

    #[test]
    fn test_per_signal_timestamps_strictly_increase() {
        let mut session = GenerationSession::new(scenario(HR_WITH_PHASE), &seeded(1)).unwrap();
        let events = session.tick(Duration::from_secs(10)).unwrap();
        let hr: Vec<Duration> = events
            .iter()
            .filter(|e| e.signal == "hr")
            .map(|e| e.timestamp)
            .collect();
        for pair in hr.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_deterministic_with_same_seed() {
        let yaml = r#"
name: noisy
signals:
  hr:
    baseline: [60, 80]
    noise: { kind: gaussian, amplitude: 2.0 }
    rate: 4/s
  breath:
    baseline: 14
    noise: 0.5
    rate: 1/s
"#;
        let sc = scenario(yaml);
        let mut a = GenerationSession::new(sc.clone(), &seeded(1234)).unwrap();
        let mut b = GenerationSession::new(sc, &seeded(1234)).unwrap();
        for step in 0..50 {
            let t = Duration::from_millis(step * 137);
            assert_eq!(a.tick(t).unwrap(), b.tick(t).unwrap());
        }
    }

    #[test]
    fn test_different_seeds_differ() {
        let yaml = r#"
name: noisy
signals:
  hr:
    baseline: [60, 80]
    noise: 2.0
    rate: 1/s
"#;
        let sc = scenario(yaml);
        let mut a = GenerationSession::new(sc.clone(), &seeded(1)).unwrap();
        let mut b = GenerationSession::new(sc, &seeded(2)).unwrap();
        let ea = a.tick(Duration::from_secs(5)).unwrap();
        let eb = b.tick(Duration::from_secs(5)).unwrap();
        assert_ne!(ea, eb);
    }

    #[test]
    fn test_range_baseline_stable_within_session() {
        let yaml = r#"
name: ranged
signals:
  hr:
    baseline: [60, 80]
    rate: 1/s
"#;
        let mut session = GenerationSession::new(scenario(yaml), &seeded(7)).unwrap();
        let events = session.tick(Duration::from_secs(5)).unwrap();
        let first = events[0].value;
        assert!((60.0..=80.0).contains(&first));
        assert!(events.iter().all(|e| e.value == first));
    }

    #[test]
    fn test_completion_at_declared_duration() {
        let yaml = r#"
name: short
duration: 3s
signals:
  hr:
    baseline: 70
    rate: 1/s
"#;
        let mut session = GenerationSession::new(scenario(yaml), &seeded(1)).unwrap();
        let events = session.tick(Duration::from_secs(3)).unwrap();
        assert_eq!(events.len(), 4); // t = 0, 1, 2, 3
        assert_eq!(session.state(), SessionState::Running);

        // Crossing the declared end completes the session; the final sample
        // at exactly t=3 was already emitted.
        let events = session.tick(Duration::from_millis(3500)).unwrap();
        assert!(events.is_empty());
        assert_eq!(session.state(), SessionState::Completed);

        // No events after completion.
        assert!(session.tick(Duration::from_secs(10)).unwrap().is_empty());
    }

    #[test]
    fn test_open_ended_never_completes() {
        let yaml = r#"
name: forever
signals:
  hr:
    baseline: 70
    rate: 1/s
"#;
        let mut session = GenerationSession::new(scenario(yaml), &seeded(1)).unwrap();
        session.tick(Duration::from_secs(3600)).unwrap();
        assert_eq!(session.state(), SessionState::Running);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut session = GenerationSession::new(scenario(HR_WITH_PHASE), &seeded(1)).unwrap();
        session.tick(Duration::from_secs(1)).unwrap();
        session.cancel();
        assert_eq!(session.state(), SessionState::Cancelled);
        session.cancel();
        assert_eq!(session.state(), SessionState::Cancelled);
        assert!(session.tick(Duration::from_secs(2)).unwrap().is_empty());
    }

    #[test]
    fn test_non_monotonic_tick_is_ignored() {
        let mut session = GenerationSession::new(scenario(HR_WITH_PHASE), &seeded(1)).unwrap();
        session.tick(Duration::from_secs(5)).unwrap();
        let events = session.tick(Duration::from_secs(2)).unwrap();
        assert!(events.is_empty());
        assert_eq!(session.elapsed(), Duration::from_secs(5));
    }

    #[test]
    fn test_loop_playback_repeats_timeline() {
        let yaml = r#"
name: looper
signals:
  hr:
    baseline: 70
    rate: 1/s
phases:
  - name: up
    duration: 2s
    overrides:
      hr: { add: 10 }
  - name: down
    duration: 2s
    overrides:
      hr: { add: -10 }
"#;
        let options = SessionOptions {
            seed: Some(1),
            loop_playback: true,
            ..Default::default()
        };
        let mut session = GenerationSession::new(scenario(yaml), &options).unwrap();
        let mut values = Vec::new();
        for secs in 0..=8 {
            let events = session.tick(Duration::from_secs(secs)).unwrap();
            values.push(events[0].value);
        }
        // Cycle is 4s: base until "up" completes at 2s, "up" until "down"
        // completes at 4s, then the timeline restarts.
        assert_eq!(
            values,
            vec![70.0, 70.0, 80.0, 80.0, 70.0, 70.0, 80.0, 80.0, 70.0]
        );
    }

    #[test]
    fn test_fresh_seed_when_none_given() {
        let sc = scenario(HR_WITH_PHASE);
        let a = GenerationSession::new(sc.clone(), &SessionOptions::default()).unwrap();
        let b = GenerationSession::new(sc, &SessionOptions::default()).unwrap();
        // Two unseeded sessions almost surely draw different seeds.
        assert_ne!(a.seed(), b.seed());
    }
}
