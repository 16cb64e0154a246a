//! Stream a built-in scenario to stdout at accelerated speed.
//!
//! Run with: cargo run --example stream_session -p synheart-sim

use std::time::Duration;
use synheart_core::observe::{init_logging, LogConfig};
use synheart_sim::{ScenarioRegistry, SessionMessage, SessionOptions, SessionStream};

fn main() {
    init_logging(&LogConfig::development());

    let registry = ScenarioRegistry::with_builtins().expect("builtin scenarios");
    println!("Available scenarios:");
    for (name, description) in registry.list_with_descriptions() {
        println!("  {:<14} {}", name, description);
    }
    println!();

    let scenario = registry.get("workout").expect("workout scenario");
    let options = SessionOptions {
        seed: Some(42),
        speed: 60.0, // one scenario minute per wall second
        ..Default::default()
    };
    let stream = SessionStream::start(scenario, options).expect("start session");

    println!("Streaming 'workout' at 60x (seed 42), ctrl-c to stop:\n");
    loop {
        match stream.recv_timeout(Duration::from_secs(5)) {
            Some(SessionMessage::Events(events)) => {
                for event in events {
                    println!(
                        "{:>8.1}s  {:<18} {:>8.2} {:<12} [{}]",
                        event.timestamp.as_secs_f64(),
                        event.signal,
                        event.value,
                        event.unit,
                        event.phase,
                    );
                }
            }
            Some(SessionMessage::Completed) => {
                println!("\nScenario completed.");
                break;
            }
            Some(SessionMessage::Failed(e)) => {
                eprintln!("session failed: {}", e);
                break;
            }
            None => {
                eprintln!("no events for 5s, giving up");
                break;
            }
        }
    }
}
