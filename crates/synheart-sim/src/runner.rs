//! Thread-per-session playback.
//!
//! Each [`SessionStream`] owns one background thread that paces a
//! [`GenerationSession`] against a clock and forwards its events over a
//! channel. Sessions share no mutable state; cancelling one never touches
//! another, and cancellation is a relaxed atomic store so it is safe from
//! any thread and never blocks on in-flight delivery.
//!
//! ```ignore
//! let registry = ScenarioRegistry::with_builtins()?;
//! let scenario = registry.get("resting")?;
//! let stream = SessionStream::start(scenario, SessionOptions::default())?;
//!
//! while let Some(message) = stream.recv_timeout(Duration::from_secs(1)) {
//!     match message {
//!         SessionMessage::Events(events) => send_to_client(events),
//!         SessionMessage::Completed => break,
//!         SessionMessage::Failed(e) => return Err(e),
//!     }
//! }
//! ```

use crate::error::{EngineError, EngineResult};
use crate::scenario::definition::Scenario;
use crate::session::{GenerationSession, SessionOptions, SessionState};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use synheart_core::timing::{TickClock, WallTickClock};
use tracing::{debug, warn};

/// Messages from a session thread to its consumer.
#[derive(Debug)]
pub enum SessionMessage {
    /// Samples that came due since the last tick
    Events(Vec<synheart_core::Event>),
    /// The session reached its scenario's declared end
    Completed,
    /// The session hit a runtime error and terminated
    Failed(EngineError),
}

/// Cross-thread cancellation signal for one session.
#[derive(Debug, Clone)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Handle to a running session thread.
///
/// Dropping the handle cancels the session and joins the thread.
#[derive(Debug)]
pub struct SessionStream {
    rx: Receiver<SessionMessage>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SessionStream {
    /// Start a session paced by the wall clock.
    pub fn start(scenario: Arc<Scenario>, options: SessionOptions) -> EngineResult<Self> {
        Self::start_with_clock(scenario, options, WallTickClock::new())
    }

    /// Start a session paced by an arbitrary clock (virtual clocks let
    /// tests drive playback without real delays).
    pub fn start_with_clock<C>(
        scenario: Arc<Scenario>,
        options: SessionOptions,
        clock: C,
    ) -> EngineResult<Self>
    where
        C: TickClock + 'static,
    {
        if !(options.speed > 0.0) || !options.speed.is_finite() {
            return Err(EngineError::validation(
                &scenario.name,
                "options.speed",
                format!("must be a positive number, got {}", options.speed),
            ));
        }
        if options.tick_interval.is_zero() {
            return Err(EngineError::validation(
                &scenario.name,
                "options.tick_interval",
                "must be > 0",
            ));
        }

        let session = GenerationSession::new(scenario, &options)?;
        let (tx, rx) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();

        let handle = thread::Builder::new()
            .name(format!("session-{}", session.scenario_name()))
            .spawn(move || session_thread(session, clock, options, tx, stop_flag))
            .map_err(|e| EngineError::Runtime(format!("failed to spawn session thread: {}", e)))?;

        Ok(Self {
            rx,
            stop,
            handle: Some(handle),
        })
    }

    /// Non-blocking poll for the next message.
    pub fn poll(&self) -> Option<SessionMessage> {
        self.rx.try_recv().ok()
    }

    /// Blocking receive with a timeout. None on timeout or after the
    /// session thread has finished and drained.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<SessionMessage> {
        match self.rx.recv_timeout(timeout) {
            Ok(message) => Some(message),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Request cancellation. Returns immediately; the thread notices on its
    /// next tick.
    pub fn cancel(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Token that can cancel this session from any thread (e.g. a transport
    /// disconnect handler), independent of this handle's lifetime.
    pub fn cancel_token(&self) -> CancelToken {
        CancelToken(self.stop.clone())
    }

    /// True once the session thread has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for SessionStream {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("session thread panicked");
            }
        }
    }
}

fn session_thread<C: TickClock>(
    mut session: GenerationSession,
    clock: C,
    options: SessionOptions,
    tx: Sender<SessionMessage>,
    stop: Arc<AtomicBool>,
) {
    debug!(scenario = %session.scenario_name(), speed = options.speed, "session thread started");

    loop {
        if stop.load(Ordering::Relaxed) {
            session.cancel();
            break;
        }

        let elapsed = clock.elapsed().mul_f64(options.speed);
        match session.tick(elapsed) {
            Ok(events) => {
                if !events.is_empty() && tx.send(SessionMessage::Events(events)).is_err() {
                    // Consumer went away; treat as disconnect.
                    session.cancel();
                    break;
                }
            }
            Err(e) => {
                warn!(scenario = %session.scenario_name(), error = %e, "session failed");
                let _ = tx.send(SessionMessage::Failed(e));
                break;
            }
        }

        if session.state() == SessionState::Completed {
            let _ = tx.send(SessionMessage::Completed);
            break;
        }

        thread::sleep(options.tick_interval);
    }

    debug!(scenario = %session.scenario_name(), "session thread stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::definition::Scenario;
    use synheart_core::timing::VirtualClock;

    fn scenario(yaml: &str) -> Arc<Scenario> {
        Arc::new(Scenario::parse(yaml, "test.yaml").unwrap())
    }

    fn fast_options(seed: u64) -> SessionOptions {
        SessionOptions {
            seed: Some(seed),
            tick_interval: Duration::from_millis(1),
            ..Default::default()
        }
    }

    const SHORT: &str = r#"
name: short
duration: 3s
signals:
  hr:
    baseline: 70
    rate: 1/s
    unit: bpm
"#;

    fn drain_until_completed(stream: &SessionStream) -> Vec<synheart_core::Event> {
        let mut events = Vec::new();
        loop {
            match stream.recv_timeout(Duration::from_secs(5)) {
                Some(SessionMessage::Events(batch)) => events.extend(batch),
                Some(SessionMessage::Completed) => return events,
                Some(SessionMessage::Failed(e)) => panic!("session failed: {}", e),
                None => panic!("timed out waiting for completion"),
            }
        }
    }

    #[test]
    fn test_virtual_clock_drives_completion() {
        let clock = VirtualClock::new();
        let stream =
            SessionStream::start_with_clock(scenario(SHORT), fast_options(42), clock.clone())
                .unwrap();

        clock.advance(Duration::from_millis(3500));
        let events = drain_until_completed(&stream);
        assert_eq!(events.len(), 4); // t = 0, 1, 2, 3
        assert!(events.iter().all(|e| e.value == 70.0));
    }

    #[test]
    fn test_runner_matches_direct_ticks() {
        let yaml = r#"
name: noisy
duration: 5s
signals:
  hr:
    baseline: [60, 80]
    noise: { kind: gaussian, amplitude: 2.0 }
    rate: 2/s
"#;
        let sc = scenario(yaml);

        let clock = VirtualClock::new();
        let stream =
            SessionStream::start_with_clock(sc.clone(), fast_options(7), clock.clone()).unwrap();
        clock.advance(Duration::from_millis(5500));
        let streamed = drain_until_completed(&stream);

        let mut direct = GenerationSession::new(sc, &fast_options(7)).unwrap();
        let expected = direct.tick(Duration::from_millis(5500)).unwrap();

        assert_eq!(streamed, expected);
    }

    #[test]
    fn test_cancel_from_another_thread() {
        let yaml = r#"
name: forever
signals:
  hr:
    baseline: 70
    rate: 100/s
"#;
        let stream = SessionStream::start_with_clock(
            scenario(yaml),
            fast_options(1),
            WallTickClock::new(),
        )
        .unwrap();

        // First events prove the thread is producing.
        assert!(stream.recv_timeout(Duration::from_secs(5)).is_some());

        let token = stream.cancel_token();
        let canceller = thread::spawn(move || token.cancel());
        canceller.join().unwrap();

        // The thread notices the flag and exits; the channel drains then
        // disconnects without a Completed message.
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while !stream.is_finished() {
            assert!(std::time::Instant::now() < deadline, "thread did not stop");
            thread::sleep(Duration::from_millis(5));
        }
        while let Some(message) = stream.poll() {
            assert!(matches!(message, SessionMessage::Events(_)));
        }
    }

    #[test]
    fn test_cancel_twice_is_safe() {
        let stream = SessionStream::start_with_clock(
            scenario(SHORT),
            fast_options(1),
            VirtualClock::new(),
        )
        .unwrap();
        stream.cancel();
        stream.cancel();
        let token = stream.cancel_token();
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_rejects_bad_speed() {
        let options = SessionOptions {
            speed: 0.0,
            ..fast_options(1)
        };
        let err = SessionStream::start(scenario(SHORT), options).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_speed_multiplier_scales_playback() {
        let clock = VirtualClock::new();
        let options = SessionOptions {
            speed: 10.0,
            ..fast_options(42)
        };
        let stream =
            SessionStream::start_with_clock(scenario(SHORT), options, clock.clone()).unwrap();

        // 0.35 virtual seconds at 10x covers the whole 3s scenario.
        clock.advance(Duration::from_millis(350));
        let events = drain_until_completed(&stream);
        assert_eq!(events.len(), 4);
    }
}
