use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use rand::Rng;
use tracing::{info, warn};

use crate::desktop::{KeyInjector, WindowFocuser, WindowInfo, WindowLister};
use crate::engine::Engine;
use crate::runtime::AppEvent;
use crate::typing_policy::{ACCURACY_RANGE, WPM_RANGE};

const WPM_STEP: f64 = 5.0;
const ACCURACY_STEP: f64 = 1.0;

/// Interactive front end state: the engine plus the controls around it.
pub struct App<R, D> {
    pub engine: Engine<R, D>,
    pub text: String,
    /// Keys edit `text` instead of driving the controls
    pub editing: bool,
    pub wpm: f64,
    pub accuracy: f64,
    pub exclude_title: String,
    pub windows: Vec<WindowInfo>,
    /// Index into `windows`; `None` types into the preview only
    pub selected: Option<usize>,
    pub window_hint: String,
    /// Last validation message, cleared on the next successful start
    pub message: Option<String>,
    pub should_quit: bool,
}

impl<R, D> App<R, D>
where
    R: Rng,
    D: WindowLister + WindowFocuser + KeyInjector,
{
    pub fn new(
        engine: Engine<R, D>,
        text: String,
        wpm: f64,
        accuracy: f64,
        exclude_title: String,
    ) -> Self {
        Self {
            engine,
            editing: text.trim().is_empty(),
            text,
            wpm,
            accuracy,
            exclude_title,
            windows: Vec::new(),
            selected: None,
            window_hint: String::new(),
            message: None,
            should_quit: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.engine.is_running()
    }

    pub fn target(&self) -> Option<&WindowInfo> {
        self.selected.and_then(|i| self.windows.get(i))
    }

    /// Re-list windows, keeping the current selection if it still exists.
    pub fn refresh_windows(&mut self) {
        if self.is_running() {
            return;
        }

        let previous = self.target().map(|w| w.id.clone());
        match self.engine.desktop().list_windows(&self.exclude_title) {
            Ok(windows) => {
                self.windows = windows;
                self.selected = previous
                    .and_then(|id| self.windows.iter().position(|w| w.id == id));
                self.window_hint = match self.windows.len() {
                    0 => "No other windows found. Open an app and press r.".to_string(),
                    1 => "1 window found. Select it to type into it.".to_string(),
                    n => format!("{n} windows found. Select one to type into it."),
                };
            }
            Err(err) => {
                warn!(error = %err, "could not list windows");
                self.windows.clear();
                self.selected = None;
                self.window_hint = format!("Could not list windows: {err}");
            }
        }
    }

    /// Cycle preview-only → first window → … → last window → preview-only.
    pub fn select_next(&mut self) {
        if self.is_running() {
            return;
        }
        self.selected = match self.selected {
            None if !self.windows.is_empty() => Some(0),
            Some(i) if i + 1 < self.windows.len() => Some(i + 1),
            _ => None,
        };
    }

    pub fn select_prev(&mut self) {
        if self.is_running() {
            return;
        }
        self.selected = match self.selected {
            None => self.windows.len().checked_sub(1),
            Some(0) => None,
            Some(i) => Some(i - 1),
        };
    }

    pub fn adjust_wpm(&mut self, delta: f64) {
        if !self.is_running() {
            self.wpm = (self.wpm + delta).clamp(*WPM_RANGE.start(), *WPM_RANGE.end());
        }
    }

    pub fn adjust_accuracy(&mut self, delta: f64) {
        if !self.is_running() {
            self.accuracy =
                (self.accuracy + delta).clamp(*ACCURACY_RANGE.start(), *ACCURACY_RANGE.end());
        }
    }

    pub fn start(&mut self, now: Duration) {
        if self.is_running() {
            return;
        }
        self.editing = false;
        let target = self.target().map(|w| w.id.clone());
        match self
            .engine
            .start(now, &self.text, self.wpm, self.accuracy, target)
        {
            Ok(()) => self.message = None,
            Err(err) => {
                info!(error = %err, "start refused");
                self.message = Some(err.to_string());
            }
        }
    }

    pub fn stop(&mut self) {
        self.engine.stop();
    }

    pub fn clear(&mut self) {
        self.engine.clear();
    }

    /// Shown above the output when keystrokes also go to another window.
    pub fn output_label(&self) -> Option<String> {
        self.target()
            .map(|w| format!("mirroring: typing into \"{}\"", w.display_title()))
    }

    pub fn on_tick(&mut self, now: Duration) {
        self.engine.poll(now);
    }

    pub fn on_event(&mut self, event: AppEvent, now: Duration) {
        match event {
            AppEvent::Key(key) => self.on_key(key, now),
            AppEvent::Paste(text) => self.on_paste(&text),
            AppEvent::Tick => {}
        }
        self.on_tick(now);
    }

    /// Pasted text is appended to the source text. Ignored mid-session.
    pub fn on_paste(&mut self, pasted: &str) {
        if self.is_running() {
            return;
        }
        self.text
            .push_str(&pasted.replace("\r\n", "\n").replace('\r', "\n"));
        self.editing = true;
        self.message = None;
    }

    fn on_edit_key(&mut self, key: KeyEvent, now: Duration) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.editing = false,
            KeyCode::F(5) => self.start(now),
            KeyCode::Enter => self.text.push('\n'),
            KeyCode::Tab => self.text.push('\t'),
            KeyCode::Backspace => {
                self.text.pop();
            }
            KeyCode::Char('u') if ctrl => self.text.clear(),
            KeyCode::Char(c) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
                self.text.push(c)
            }
            _ => {}
        }
    }

    pub fn on_key(&mut self, key: KeyEvent, now: Duration) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        if self.editing && !self.is_running() {
            self.on_edit_key(key, now);
            return;
        }

        match key.code {
            KeyCode::Esc if self.is_running() => self.stop(),
            KeyCode::Esc | KeyCode::Char('q') => {
                if !self.is_running() {
                    self.should_quit = true;
                }
            }
            KeyCode::Enter | KeyCode::F(5) => self.start(now),
            KeyCode::Char('s') => self.stop(),
            KeyCode::Char('c') => self.clear(),
            KeyCode::Char('e') if !self.is_running() => self.editing = true,
            KeyCode::Char('r') => self.refresh_windows(),
            KeyCode::Tab | KeyCode::Down => self.select_next(),
            KeyCode::BackTab | KeyCode::Up => self.select_prev(),
            KeyCode::Char('+') | KeyCode::Char('=') => self.adjust_wpm(WPM_STEP),
            KeyCode::Char('-') => self.adjust_wpm(-WPM_STEP),
            KeyCode::Char(']') => self.adjust_accuracy(ACCURACY_STEP),
            KeyCode::Char('[') => self.adjust_accuracy(-ACCURACY_STEP),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desktop::RecordingDesktop;
    use crate::engine::Status;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn app(text: &str, windows: Vec<WindowInfo>) -> App<StdRng, RecordingDesktop> {
        let engine = Engine::new(
            StdRng::seed_from_u64(1),
            RecordingDesktop::with_windows(windows),
        );
        App::new(engine, text.to_string(), 60.0, 100.0, "autotype".into())
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn windows() -> Vec<WindowInfo> {
        vec![
            WindowInfo::new("0x1", "Editor"),
            WindowInfo::new("0x2", "AutoType"),
            WindowInfo::new("0x3", "Browser"),
        ]
    }

    #[test]
    fn refresh_excludes_own_window_and_keeps_selection() {
        let mut app = app("hi", windows());
        app.refresh_windows();
        assert_eq!(app.windows.len(), 2);
        assert_eq!(app.window_hint, "2 windows found. Select one to type into it.");

        app.select_next();
        app.select_next();
        assert_eq!(app.target().map(|w| w.id.as_str()), Some("0x3"));

        app.refresh_windows();
        assert_eq!(app.target().map(|w| w.id.as_str()), Some("0x3"));
    }

    #[test]
    fn refresh_with_no_windows_gives_hint() {
        let mut app = app("hi", vec![]);
        app.refresh_windows();
        assert!(app.window_hint.starts_with("No other windows found"));
        assert_eq!(app.selected, None);
    }

    #[test]
    fn selection_cycles_through_preview_only() {
        let mut app = app("hi", windows());
        app.refresh_windows();
        app.select_prev();
        assert_eq!(app.selected, Some(1));
        app.select_next();
        assert_eq!(app.selected, None);
        app.select_next();
        assert_eq!(app.selected, Some(0));
        app.select_prev();
        assert_eq!(app.selected, None);
    }

    #[test]
    fn invalid_start_shows_message() {
        let mut app = app("   ", vec![]);
        app.editing = false;
        app.on_key(key(KeyCode::Enter), Duration::ZERO);
        assert!(!app.is_running());
        assert_eq!(
            app.message.as_deref(),
            Some("please provide some text to type")
        );
    }

    #[test]
    fn controls_are_locked_while_running() {
        let mut app = app("hello there", windows());
        app.refresh_windows();
        app.on_key(key(KeyCode::Enter), Duration::ZERO);
        assert!(app.is_running());

        app.on_key(key(KeyCode::Tab), Duration::ZERO);
        app.on_key(key(KeyCode::Char('+')), Duration::ZERO);
        assert_eq!(app.selected, None);
        assert_eq!(app.wpm, 60.0);

        // Esc stops first, quits second
        app.on_key(key(KeyCode::Esc), Duration::ZERO);
        assert!(!app.is_running());
        assert!(!app.should_quit);
        assert_eq!(app.engine.status(), &Status::Stopped);
        app.on_key(key(KeyCode::Esc), Duration::ZERO);
        assert!(app.should_quit);
    }

    #[test]
    fn settings_are_clamped() {
        let mut app = app("hi", vec![]);
        for _ in 0..100 {
            app.on_key(key(KeyCode::Char('+')), Duration::ZERO);
            app.on_key(key(KeyCode::Char('[')), Duration::ZERO);
        }
        assert_eq!(app.wpm, 300.0);
        assert_eq!(app.accuracy, 70.0);
    }

    #[test]
    fn targeted_start_uses_selected_window() {
        let mut app = app("hey", windows());
        app.refresh_windows();
        app.select_next();
        assert_eq!(
            app.output_label().as_deref(),
            Some("mirroring: typing into \"Editor\"")
        );
        app.start(Duration::ZERO);
        assert_eq!(app.engine.status(), &Status::Countdown(3));
        assert_eq!(
            app.engine.config().and_then(|c| c.target_window.as_deref()),
            Some("0x1")
        );
    }

    #[test]
    fn clear_empties_output() {
        let mut app = app("abc", vec![]);
        app.start(Duration::ZERO);
        assert_eq!(app.engine.output(), "a");
        app.on_key(key(KeyCode::Char('c')), Duration::ZERO);
        assert_eq!(app.engine.output(), "");
        assert!(!app.is_running());
    }

    #[test]
    fn empty_text_opens_the_editor() {
        let mut app = app("", vec![]);
        assert!(app.editing);
        for c in "hi q".chars() {
            app.on_key(key(KeyCode::Char(c)), Duration::ZERO);
        }
        app.on_key(key(KeyCode::Backspace), Duration::ZERO);
        app.on_key(key(KeyCode::Enter), Duration::ZERO);
        app.on_key(key(KeyCode::Char('s')), Duration::ZERO);
        assert_eq!(app.text, "hi \ns");
        assert!(!app.should_quit);
        assert!(!app.is_running());

        app.on_key(
            KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL),
            Duration::ZERO,
        );
        assert_eq!(app.text, "");
    }

    #[test]
    fn esc_leaves_the_editor_and_enter_then_starts() {
        let mut app = app("", vec![]);
        app.on_key(key(KeyCode::Char('x')), Duration::ZERO);
        app.on_key(key(KeyCode::Esc), Duration::ZERO);
        assert!(!app.editing);
        assert!(!app.should_quit);

        app.on_key(key(KeyCode::Enter), Duration::ZERO);
        assert_eq!(app.engine.output(), "x");
        app.on_tick(Duration::from_secs(1));
        assert_eq!(app.engine.status(), &Status::Finished);
    }

    #[test]
    fn paste_appends_with_normalized_newlines() {
        let mut app = app("one", vec![]);
        assert!(!app.editing);
        app.on_paste(" two\r\nthree\r");
        assert_eq!(app.text, "one two\nthree\n");
        assert!(app.editing);

        app.on_key(key(KeyCode::F(5)), Duration::ZERO);
        assert!(app.is_running());
        assert!(!app.editing);
    }

    #[test]
    fn text_is_locked_while_running() {
        let mut app = app("hello there", vec![]);
        app.start(Duration::ZERO);
        app.on_paste("more");
        app.on_key(key(KeyCode::Char('e')), Duration::ZERO);
        assert_eq!(app.text, "hello there");
        assert!(!app.editing);
    }
}
