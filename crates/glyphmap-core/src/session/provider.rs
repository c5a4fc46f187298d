//! The keyboard-mapping collaborator trait.
//!
//! Implemented in the `glyphmap` crate by the x11rb-backed `X11Keyboard` and
//! by an in-memory mock.

use thiserror::Error;

use crate::domain::location::{KeyLocation, Keycode, Keysym};

/// Failure reported by the display-server connection.
///
/// The session never interprets these; they propagate to the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The display could not be opened or the connection was lost.
    #[error("display connection failed: {0}")]
    Connection(String),

    /// The server rejected or failed a request.
    #[error("request failed: {0}")]
    Request(String),

    /// The keycode lies outside the range the server reported at setup.
    #[error("keycode {keycode} outside server range {min}..={max}")]
    KeycodeOutOfRange {
        keycode: Keycode,
        min: Keycode,
        max: Keycode,
    },
}

/// Read/write access to the display server's keyboard mapping.
#[cfg_attr(test, mockall::automock)]
pub trait KeyboardMapping {
    /// Returns every slot currently producing `keysym`, ordered by level and
    /// then keycode.  An empty list means the keysym is not reachable.
    fn keycodes_for_keysym(&self, keysym: Keysym) -> Result<Vec<KeyLocation>, ProtocolError>;

    /// Returns the full keysym list of `keycode`.
    fn keysyms_for_keycode(&self, keycode: Keycode) -> Result<Vec<Keysym>, ProtocolError>;

    /// Replaces the full keysym list of `keycode`.
    fn set_keysyms(&mut self, keycode: Keycode, keysyms: &[Keysym]) -> Result<(), ProtocolError>;

    /// Sends everything buffered so far to the display server.
    fn flush(&mut self) -> Result<(), ProtocolError>;
}
