//! The typing engine: a single-session state machine that advances one
//! source character per step.
//!
//! Time never passes inside the engine. Callers hand it `now` (from any
//! [`Clock`](crate::timer::Clock)), ask for [`Engine::next_deadline`], wait,
//! and call [`Engine::poll`]. There is at most one pending step at a time.

use std::fmt;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, info, warn};

use crate::desktop::{KeyInjector, ServiceError, WindowFocuser};
use crate::session::{SessionConfig, SessionState, StartError};
use crate::timer::Timer;
use crate::typing_policy::{char_delay, correction_delay, decide};

/// What the engine is doing, for display.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    Countdown(u32),
    Typing,
    Finished,
    Stopped,
    FocusFailed(String),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Idle => write!(f, "Ready"),
            Status::Countdown(n) => write!(f, "Switching to window in {n}…"),
            Status::Typing => write!(f, "Typing…"),
            Status::Finished => write!(f, "Done"),
            Status::Stopped => write!(f, "Stopped"),
            Status::FocusFailed(reason) => write!(f, "Could not focus window: {reason}"),
        }
    }
}

/// Fixed delays around the focus handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineTiming {
    pub countdown_steps: u32,
    pub countdown_step: Duration,
    /// Pause after focusing, before the first character
    pub settle: Duration,
}

impl Default for EngineTiming {
    fn default() -> Self {
        Self {
            countdown_steps: 3,
            countdown_step: Duration::from_secs(1),
            settle: Duration::from_millis(150),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// Show `n`, then wait one countdown step. Zero means focus now.
    Countdown(u32),
    Type,
    /// Backspace the typo and retype `intended`
    Correct { intended: char },
}

pub struct Engine<R, D> {
    rng: R,
    desktop: D,
    timing: EngineTiming,
    config: Option<SessionConfig>,
    state: SessionState,
    status: Status,
    timer: Timer<Step>,
}

impl<R: Rng, D: WindowFocuser + KeyInjector> Engine<R, D> {
    pub fn new(rng: R, desktop: D) -> Self {
        Self {
            rng,
            desktop,
            timing: EngineTiming::default(),
            config: None,
            state: SessionState::default(),
            status: Status::Idle,
            timer: Timer::new(),
        }
    }

    pub fn with_timing(mut self, timing: EngineTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Begin a new session. Refused without any state change when the
    /// parameters are invalid.
    ///
    /// Without a target window the first character is typed right away.
    /// With one, the countdown starts and typing follows the focus handshake.
    pub fn start(
        &mut self,
        now: Duration,
        text: &str,
        wpm: f64,
        accuracy: f64,
        target_window: Option<String>,
    ) -> Result<(), StartError> {
        let config = SessionConfig::new(text, wpm, accuracy, target_window)?;

        info!(
            chars = config.len(),
            wpm,
            accuracy,
            target = ?config.target_window,
            "session started"
        );

        self.timer.cancel();
        self.state = SessionState::begin();
        let first = if config.target_window.is_some() {
            Step::Countdown(self.timing.countdown_steps)
        } else {
            self.status = Status::Typing;
            Step::Type
        };
        self.config = Some(config);
        self.run(now, first);
        Ok(())
    }

    /// Cancel the pending step. Safe to call at any time.
    pub fn stop(&mut self) {
        if !self.state.running && !self.timer.is_pending() {
            return;
        }
        info!(cursor = self.state.cursor_pos, "session stopped");
        self.halt(Status::Stopped);
    }

    /// Stop and wipe the output buffer.
    pub fn clear(&mut self) {
        self.stop();
        self.state.output.clear();
    }

    /// Run the pending step if it is due. Returns whether a step ran.
    pub fn poll(&mut self, now: Duration) -> bool {
        match self.timer.take_due(now) {
            Some(step) => {
                self.run(now, step);
                true
            }
            None => false,
        }
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.timer.deadline()
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    /// True between a typo and its correction.
    pub fn is_correcting(&self) -> bool {
        matches!(self.timer.peek(), Some(Step::Correct { .. }))
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn output(&self) -> &str {
        &self.state.output
    }

    pub fn cursor(&self) -> usize {
        self.state.cursor_pos
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> Option<&SessionConfig> {
        self.config.as_ref()
    }

    pub fn desktop(&self) -> &D {
        &self.desktop
    }

    fn run(&mut self, now: Duration, step: Step) {
        match step {
            Step::Countdown(0) => self.focus_target(now),
            Step::Countdown(n) => {
                self.status = Status::Countdown(n);
                self.timer.schedule(now, self.timing.countdown_step, Step::Countdown(n - 1));
            }
            Step::Type => self.type_next(now),
            Step::Correct { intended } => self.correct(now, intended),
        }
    }

    fn focus_target(&mut self, now: Duration) {
        let Some(id) = self.config.as_ref().and_then(|c| c.target_window.clone()) else {
            return self.halt(Status::Idle);
        };

        match self.desktop.focus_window(&id) {
            Ok(()) => {
                debug!(window = %id, "focused target window");
                self.status = Status::Typing;
                self.timer.schedule(now, self.timing.settle, Step::Type);
            }
            Err(err) => {
                warn!(window = %id, error = %err, "could not focus target window");
                self.halt(Status::FocusFailed(err.to_string()));
            }
        }
    }

    fn type_next(&mut self, now: Duration) {
        let Some(config) = &self.config else {
            return self.halt(Status::Idle);
        };
        let (wpm, accuracy) = (config.wpm, config.accuracy);
        let has_target = config.target_window.is_some();

        let next = config
            .text
            .get(self.state.cursor_pos)
            .copied()
            .filter(|_| self.state.running);
        let Some(c) = next else {
            info!(
                chars = self.state.cursor_pos,
                mistakes = self.state.mistakes,
                "session finished"
            );
            return self.halt(Status::Finished);
        };

        let decision = decide(c, accuracy, &mut self.rng);
        self.state.output.push(decision.typed);
        if has_target {
            let result = self.desktop.type_char(decision.typed);
            self.note_injection(result);
        }

        if decision.mistake {
            self.state.mistakes += 1;
            debug!(typed = ?decision.typed, intended = ?c, "typo");
            let delay = correction_delay(&mut self.rng);
            self.timer.schedule(now, delay, Step::Correct { intended: c });
        } else {
            self.state.cursor_pos += 1;
            let delay = char_delay(wpm, c, &mut self.rng);
            self.timer.schedule(now, delay, Step::Type);
        }
    }

    fn correct(&mut self, now: Duration, intended: char) {
        let Some(config) = &self.config else {
            return self.halt(Status::Idle);
        };
        let wpm = config.wpm;
        let has_target = config.target_window.is_some();

        self.state.output.pop();
        self.state.output.push(intended);
        if has_target {
            let result = self.desktop.backspace();
            self.note_injection(result);
            let result = self.desktop.type_char(intended);
            self.note_injection(result);
        }

        self.state.cursor_pos += 1;
        let delay = char_delay(wpm, intended, &mut self.rng);
        self.timer.schedule(now, delay, Step::Type);
    }

    /// Keystroke failures are logged and counted; the session carries on.
    fn note_injection(&mut self, result: Result<(), ServiceError>) {
        if let Err(err) = result {
            self.state.injection_failures += 1;
            warn!(
                cursor = self.state.cursor_pos,
                error = %err,
                "keystroke injection failed"
            );
        }
    }

    fn halt(&mut self, status: Status) {
        self.timer.cancel();
        self.state.running = false;
        self.status = status;
    }
}
