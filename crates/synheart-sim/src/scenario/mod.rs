//! Scenario definitions and the machinery that evaluates them.
//!
//! A scenario is loaded once, validated, and never mutated; everything
//! session-specific (resolved baselines, RNG state, due times) lives in the
//! session, so any number of sessions can play the same definition
//! concurrently.

pub mod builtin;
pub mod definition;
pub mod registry;
pub mod sampler;
pub mod schedule;

pub use definition::{
    Baseline, NoiseConfig, NoiseKind, NoiseShape, Override, Phase, Scenario, SignalConfig,
};
pub use registry::ScenarioRegistry;
pub use sampler::SignalSampler;
pub use schedule::{EffectiveSignal, PhaseSchedule, ResolvedBaselines};
