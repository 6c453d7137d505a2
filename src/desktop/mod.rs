//! Window discovery, focus and keystroke injection.
//!
//! The engine only sees the three capability traits below. Windows are
//! listed and focused by a per-platform [`WindowBackend`] chosen once at
//! startup. Keystrokes always go through [`EnigoInjector`].

mod keys;
mod macos;
mod recording;
mod windows;
mod x11;

use std::io;
use std::process::Command;

use thiserror::Error;
use tracing::debug;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub use keys::EnigoInjector;
pub use macos::MacDesktop;
pub use recording::{Call, RecordingDesktop};
pub use windows::WindowsDesktop;
pub use x11::X11Desktop;

const MAX_TITLE_WIDTH: usize = 60;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("`{tool}` is not installed or not on PATH")]
    ToolMissing { tool: &'static str },
    #[error("window control is not supported on {0}")]
    Unsupported(&'static str),
    #[error("`{tool}` failed ({status}): {stderr}")]
    CommandFailed {
        tool: &'static str,
        status: String,
        stderr: String,
    },
    #[error("no window with id {0:?}")]
    WindowNotFound(String),
    #[error("keyboard is unavailable: {0}")]
    KeyboardUnavailable(String),
    #[error("keystroke failed: {0}")]
    Keystroke(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A visible top-level window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    pub id: String,
    pub title: String,
}

impl WindowInfo {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }

    /// Title cut down to 60 columns for pickers.
    pub fn display_title(&self) -> String {
        if self.title.width() <= MAX_TITLE_WIDTH {
            return self.title.clone();
        }

        let mut out = String::new();
        let mut width = 0;
        for c in self.title.chars() {
            let w = c.width().unwrap_or(0);
            if width + w > MAX_TITLE_WIDTH - 3 {
                break;
            }
            width += w;
            out.push(c);
        }
        out.push('…');
        out
    }
}

pub trait WindowLister {
    /// Visible top-level windows, minus the ones whose title contains
    /// `exclude_title` (case-insensitive).
    fn list_windows(&self, exclude_title: &str) -> Result<Vec<WindowInfo>, ServiceError>;
}

pub trait WindowFocuser {
    fn focus_window(&self, id: &str) -> Result<(), ServiceError>;
}

/// Sends keystrokes to whichever window has input focus.
///
/// Newline and tab are sent as the Return and Tab keys.
pub trait KeyInjector {
    fn type_char(&mut self, c: char) -> Result<(), ServiceError>;
    fn backspace(&mut self) -> Result<(), ServiceError>;
}

/// Fallback for platforms without a window backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedDesktop;

impl WindowLister for UnsupportedDesktop {
    fn list_windows(&self, _exclude_title: &str) -> Result<Vec<WindowInfo>, ServiceError> {
        Err(ServiceError::Unsupported(std::env::consts::OS))
    }
}

impl WindowFocuser for UnsupportedDesktop {
    fn focus_window(&self, _id: &str) -> Result<(), ServiceError> {
        Err(ServiceError::Unsupported(std::env::consts::OS))
    }
}

/// Window control for the platform we are running on.
#[derive(Debug, Clone, Copy, strum_macros::Display)]
pub enum WindowBackend {
    #[strum(serialize = "x11")]
    X11(X11Desktop),
    #[strum(serialize = "macos")]
    Mac(MacDesktop),
    #[strum(serialize = "windows")]
    Windows(WindowsDesktop),
    #[strum(serialize = "unsupported")]
    Unsupported(UnsupportedDesktop),
}

impl WindowBackend {
    pub fn detect() -> Self {
        if cfg!(target_os = "windows") {
            WindowBackend::Windows(WindowsDesktop)
        } else if cfg!(target_os = "macos") {
            WindowBackend::Mac(MacDesktop)
        } else if cfg!(unix) {
            WindowBackend::X11(X11Desktop)
        } else {
            WindowBackend::Unsupported(UnsupportedDesktop)
        }
    }
}

impl WindowLister for WindowBackend {
    fn list_windows(&self, exclude_title: &str) -> Result<Vec<WindowInfo>, ServiceError> {
        match self {
            WindowBackend::X11(d) => d.list_windows(exclude_title),
            WindowBackend::Mac(d) => d.list_windows(exclude_title),
            WindowBackend::Windows(d) => d.list_windows(exclude_title),
            WindowBackend::Unsupported(d) => d.list_windows(exclude_title),
        }
    }
}

impl WindowFocuser for WindowBackend {
    fn focus_window(&self, id: &str) -> Result<(), ServiceError> {
        match self {
            WindowBackend::X11(d) => d.focus_window(id),
            WindowBackend::Mac(d) => d.focus_window(id),
            WindowBackend::Windows(d) => d.focus_window(id),
            WindowBackend::Unsupported(d) => d.focus_window(id),
        }
    }
}

/// The real desktop: platform window control plus in-process keystrokes.
#[derive(Debug)]
pub struct NativeDesktop {
    windows: WindowBackend,
    keys: EnigoInjector,
}

impl NativeDesktop {
    pub fn detect() -> Self {
        let windows = WindowBackend::detect();
        debug!(backend = %windows, "window backend selected");
        Self {
            windows,
            keys: EnigoInjector::new(),
        }
    }

    pub fn backend(&self) -> WindowBackend {
        self.windows
    }
}

impl WindowLister for NativeDesktop {
    fn list_windows(&self, exclude_title: &str) -> Result<Vec<WindowInfo>, ServiceError> {
        self.windows.list_windows(exclude_title)
    }
}

impl WindowFocuser for NativeDesktop {
    fn focus_window(&self, id: &str) -> Result<(), ServiceError> {
        self.windows.focus_window(id)
    }
}

impl KeyInjector for NativeDesktop {
    fn type_char(&mut self, c: char) -> Result<(), ServiceError> {
        self.keys.type_char(c)
    }

    fn backspace(&mut self) -> Result<(), ServiceError> {
        self.keys.backspace()
    }
}

/// Run an external tool once and return its stdout.
pub(crate) fn run_tool(tool: &'static str, args: &[&str]) -> Result<String, ServiceError> {
    debug!(tool, ?args, "running desktop tool");

    let output = Command::new(tool).args(args).output().map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            ServiceError::ToolMissing { tool }
        } else {
            ServiceError::Io(e)
        }
    })?;

    if !output.status.success() {
        return Err(ServiceError::CommandFailed {
            tool,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Case-insensitive "should this window be hidden from the picker".
pub(crate) fn is_excluded(title: &str, exclude_title: &str) -> bool {
    title.trim().is_empty()
        || (!exclude_title.is_empty()
            && title
                .to_lowercase()
                .contains(&exclude_title.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn short_titles_are_untouched() {
        let w = WindowInfo::new("1", "Terminal");
        assert_eq!(w.display_title(), "Terminal");
    }

    #[test]
    fn long_titles_are_truncated_with_ellipsis() {
        let w = WindowInfo::new("1", "x".repeat(61));
        let shown = w.display_title();
        assert_eq!(shown.chars().count(), 58);
        assert!(shown.ends_with('…'));
        assert_eq!(WindowInfo::new("1", "y".repeat(60)).display_title().len(), 60);
    }

    #[test]
    fn exclusion_ignores_case_and_blank_titles() {
        assert!(is_excluded("AutoType - preview", "autotype"));
        assert!(is_excluded("   ", "autotype"));
        assert!(!is_excluded("Firefox", "autotype"));
        assert!(!is_excluded("Firefox", ""));
    }

    #[test]
    fn missing_tool_is_reported_as_such() {
        let err = run_tool("autotype-definitely-not-a-real-tool", &[]).unwrap_err();
        assert_matches!(err, ServiceError::ToolMissing { .. });
    }

    #[test]
    fn unsupported_backend_fails_every_call() {
        let d = WindowBackend::Unsupported(UnsupportedDesktop);
        assert_matches!(d.list_windows(""), Err(ServiceError::Unsupported(_)));
        assert_matches!(d.focus_window("1"), Err(ServiceError::Unsupported(_)));
    }

    #[test]
    fn native_desktop_defers_the_keyboard_connection() {
        let d = NativeDesktop::detect();
        assert!(!d.keys.is_connected());
        if cfg!(target_os = "linux") {
            assert_eq!(d.backend().to_string(), "x11");
        }
    }
}
