use std::cell::RefCell;

use super::{KeyInjector, ServiceError, WindowFocuser, WindowInfo, WindowLister};

/// One call made against a [`RecordingDesktop`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List,
    Focus(String),
    Type(char),
    Backspace,
}

/// In-memory desktop for tests and dry runs: remembers every call and can be
/// told to fail focus or typing.
#[derive(Debug, Default)]
pub struct RecordingDesktop {
    pub windows: Vec<WindowInfo>,
    pub focus_error: Option<String>,
    pub fail_typing: bool,
    calls: RefCell<Vec<Call>>,
}

impl RecordingDesktop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_windows(windows: Vec<WindowInfo>) -> Self {
        Self {
            windows,
            ..Self::default()
        }
    }

    pub fn failing_focus(reason: &str) -> Self {
        Self {
            focus_error: Some(reason.to_string()),
            ..Self::default()
        }
    }

    pub fn failing_keystrokes() -> Self {
        Self {
            fail_typing: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// Calls that reached the keyboard (typing and backspace).
    pub fn keystrokes(&self) -> Vec<Call> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| matches!(c, Call::Type(_) | Call::Backspace))
            .cloned()
            .collect()
    }

    /// Replay keystrokes as an editor would, yielding what the target window
    /// ends up containing.
    pub fn typed_text(&self) -> String {
        let mut text = String::new();
        for call in self.calls.borrow().iter() {
            match call {
                Call::Type(c) => text.push(*c),
                Call::Backspace => {
                    text.pop();
                }
                _ => {}
            }
        }
        text
    }

    fn keystroke_result(&self) -> Result<(), ServiceError> {
        if self.fail_typing {
            return Err(ServiceError::Keystroke("recording: input rejected".into()));
        }
        Ok(())
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

impl WindowLister for RecordingDesktop {
    fn list_windows(&self, exclude_title: &str) -> Result<Vec<WindowInfo>, ServiceError> {
        self.record(Call::List);
        Ok(self
            .windows
            .iter()
            .filter(|w| !super::is_excluded(&w.title, exclude_title))
            .cloned()
            .collect())
    }
}

impl WindowFocuser for RecordingDesktop {
    fn focus_window(&self, id: &str) -> Result<(), ServiceError> {
        self.record(Call::Focus(id.to_string()));
        match &self.focus_error {
            Some(reason) => Err(ServiceError::CommandFailed {
                tool: "recording",
                status: "exit status: 1".to_string(),
                stderr: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl KeyInjector for RecordingDesktop {
    fn type_char(&mut self, c: char) -> Result<(), ServiceError> {
        self.record(Call::Type(c));
        self.keystroke_result()
    }

    fn backspace(&mut self) -> Result<(), ServiceError> {
        self.record(Call::Backspace);
        self.keystroke_result()
    }
}
