use std::fmt;

use enigo::{Direction::Click, Enigo, Key, Keyboard, Settings};
use tracing::debug;

use super::{KeyInjector, ServiceError};

/// Keystrokes through enigo, in process.
///
/// The connection to the input system opens on the first keystroke, so
/// preview-only runs never touch the display server.
#[derive(Default)]
pub struct EnigoInjector {
    enigo: Option<Enigo>,
}

impl EnigoInjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.enigo.is_some()
    }

    fn connection(&mut self) -> Result<&mut Enigo, ServiceError> {
        let enigo = match self.enigo.take() {
            Some(enigo) => enigo,
            None => {
                let enigo = Enigo::new(&Settings::default())
                    .map_err(|err| ServiceError::KeyboardUnavailable(err.to_string()))?;
                debug!("keyboard connection opened");
                enigo
            }
        };
        Ok(self.enigo.insert(enigo))
    }
}

impl fmt::Debug for EnigoInjector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnigoInjector")
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl KeyInjector for EnigoInjector {
    fn type_char(&mut self, c: char) -> Result<(), ServiceError> {
        let enigo = self.connection()?;
        let result = match special_key(c) {
            Some(key) => enigo.key(key, Click),
            None => enigo.text(c.encode_utf8(&mut [0; 4])),
        };
        result.map_err(|err| ServiceError::Keystroke(err.to_string()))
    }

    fn backspace(&mut self) -> Result<(), ServiceError> {
        self.connection()?
            .key(Key::Backspace, Click)
            .map_err(|err| ServiceError::Keystroke(err.to_string()))
    }
}

/// Characters that editors only accept as key presses.
fn special_key(c: char) -> Option<Key> {
    match c {
        '\n' => Some(Key::Return),
        '\t' => Some(Key::Tab),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newline_and_tab_are_key_presses() {
        assert_eq!(special_key('\n'), Some(Key::Return));
        assert_eq!(special_key('\t'), Some(Key::Tab));
        assert_eq!(special_key('a'), None);
        assert_eq!(special_key(' '), None);
        assert_eq!(special_key('é'), None);
    }

    #[test]
    fn connects_lazily() {
        let keys = EnigoInjector::new();
        assert!(!keys.is_connected());
        assert_eq!(format!("{keys:?}"), "EnigoInjector { connected: false }");
    }
}
