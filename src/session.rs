use thiserror::Error;

use crate::typing_policy::{ACCURACY_RANGE, WPM_RANGE};

/// Reasons a start command is refused. Nothing changes when one is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StartError {
    #[error("please provide some text to type")]
    EmptyText,
    #[error("WPM must be between 10 and 300 (got {0})")]
    WpmOutOfRange(f64),
    #[error("accuracy must be between 70 and 100 (got {0})")]
    AccuracyOutOfRange(f64),
}

/// Range check shared by session start and the saved defaults.
pub fn check_rates(wpm: f64, accuracy: f64) -> Result<(), StartError> {
    // NaN fails `contains`, so it lands here too
    if !WPM_RANGE.contains(&wpm) {
        return Err(StartError::WpmOutOfRange(wpm));
    }
    if !ACCURACY_RANGE.contains(&accuracy) {
        return Err(StartError::AccuracyOutOfRange(accuracy));
    }
    Ok(())
}

/// The parameters of a run, checked once at start.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub text: Vec<char>,
    pub wpm: f64,
    pub accuracy: f64,
    pub target_window: Option<String>,
}

impl SessionConfig {
    pub fn new(
        text: &str,
        wpm: f64,
        accuracy: f64,
        target_window: Option<String>,
    ) -> Result<Self, StartError> {
        if text.trim().is_empty() {
            return Err(StartError::EmptyText);
        }
        check_rates(wpm, accuracy)?;

        Ok(Self {
            text: text.chars().collect(),
            wpm,
            accuracy,
            target_window: target_window.filter(|id| !id.is_empty()),
        })
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Index of the next source character; only ever moves forward
    pub cursor_pos: usize,
    pub running: bool,
    /// Everything emitted so far, typos included until they are corrected
    pub output: String,
    pub mistakes: usize,
    pub injection_failures: usize,
}

impl SessionState {
    /// Fresh state for a new run: cursor at 0, empty output, running.
    pub fn begin() -> Self {
        Self {
            running: true,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn rejects_blank_text() {
        assert_matches!(
            SessionConfig::new("  \n\t ", 60.0, 95.0, None),
            Err(StartError::EmptyText)
        );
    }

    #[test]
    fn rejects_out_of_range_numbers() {
        assert_matches!(
            SessionConfig::new("hi", 9.0, 95.0, None),
            Err(StartError::WpmOutOfRange(_))
        );
        assert_matches!(
            SessionConfig::new("hi", 301.0, 95.0, None),
            Err(StartError::WpmOutOfRange(_))
        );
        assert_matches!(
            SessionConfig::new("hi", f64::NAN, 95.0, None),
            Err(StartError::WpmOutOfRange(_))
        );
        assert_matches!(
            SessionConfig::new("hi", 60.0, 69.9, None),
            Err(StartError::AccuracyOutOfRange(_))
        );
        assert_matches!(
            SessionConfig::new("hi", 60.0, 100.5, None),
            Err(StartError::AccuracyOutOfRange(_))
        );
    }

    #[test]
    fn accepts_boundaries_and_keeps_text_untrimmed() {
        let cfg = SessionConfig::new(" hi ", 10.0, 70.0, None).unwrap();
        assert_eq!(cfg.len(), 4);
        assert!(SessionConfig::new("hi", 300.0, 100.0, None).is_ok());
    }

    #[test]
    fn empty_window_id_means_no_target() {
        let cfg = SessionConfig::new("hi", 60.0, 100.0, Some(String::new())).unwrap();
        assert_eq!(cfg.target_window, None);
    }
}
