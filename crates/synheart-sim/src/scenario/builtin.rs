//! Scenarios compiled into the engine.
//!
//! These ship with every build so `list-scenarios` is useful out of the box
//! even without a scenario directory. They go through the same parse and
//! validation path as files on disk.

/// (origin label, YAML source) pairs for the embedded scenarios.
pub const BUILTIN_SCENARIOS: &[(&str, &str)] = &[
    ("builtin:resting", include_str!("../../scenarios/resting.yaml")),
    ("builtin:workout", include_str!("../../scenarios/workout.yaml")),
    (
        "builtin:stress_test",
        include_str!("../../scenarios/stress_test.yaml"),
    ),
    ("builtin:sleep", include_str!("../../scenarios/sleep.yaml")),
];
