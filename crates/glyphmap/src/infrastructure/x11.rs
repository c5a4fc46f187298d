//! X11 keyboard mapping via the x11rb pure-Rust protocol client.
//!
//! # How the mapping is read and written (for beginners)
//!
//! `GetKeyboardMapping(first, count)` returns one flat `Vec<u32>` holding
//! `count` rows of `keysyms_per_keycode` keysyms each; row `i` belongs to
//! keycode `first + i`.  `ChangeKeyboardMapping` takes the same shape, so
//! replacing one key means sending one row with its full keysym list.
//!
//! The server reports the valid keycode range at connection setup
//! (`min_keycode..=max_keycode`, usually `8..=255`).  Requests outside it
//! would fail with `BadValue`; this adapter rejects them before sending.

use glyphmap_core::{
    with_session, GlyphResolver, KeyLocation, KeyboardMapping, Keycode, Keysym, MappingError,
    MappingSession, ModifierLevel, ProtocolError, NO_SYMBOL,
};
use tracing::{debug, info};
use x11rb::connection::Connection;
use x11rb::errors::{ConnectionError, ReplyError};
use x11rb::protocol::xproto::{ConnectionExt as _, GetKeyboardMappingReply};
use x11rb::rust_connection::RustConnection;

/// Keyboard mapping backed by a live X server connection.
pub struct X11Keyboard<C: Connection = RustConnection> {
    conn: C,
    min_keycode: Keycode,
    max_keycode: Keycode,
}

impl X11Keyboard<RustConnection> {
    /// Opens `display`, or `$DISPLAY` when `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Connection`] if the display cannot be opened.
    pub fn connect(display: Option<&str>) -> Result<Self, ProtocolError> {
        let (conn, screen) = x11rb::connect(display).map_err(|e| {
            let shown = display
                .map(str::to_string)
                .or_else(|| std::env::var("DISPLAY").ok())
                .unwrap_or_else(|| "<unset>".to_string());
            ProtocolError::Connection(format!("cannot open display {shown}: {e}"))
        })?;
        let keyboard = Self::new(conn);
        info!(
            screen,
            min_keycode = keyboard.min_keycode,
            max_keycode = keyboard.max_keycode,
            "connected to X server"
        );
        Ok(keyboard)
    }
}

impl<C: Connection> X11Keyboard<C> {
    /// Wraps an established connection.
    pub fn new(conn: C) -> Self {
        let setup = conn.setup();
        let (min_keycode, max_keycode) = (setup.min_keycode, setup.max_keycode);
        Self {
            conn,
            min_keycode,
            max_keycode,
        }
    }

    /// The keycode range reported by the server.
    pub fn keycode_range(&self) -> std::ops::RangeInclusive<Keycode> {
        self.min_keycode..=self.max_keycode
    }

    /// Reads every row of the mapping in one request.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] if the request fails.
    pub fn mapping_table(&self) -> Result<Vec<(Keycode, Vec<Keysym>)>, ProtocolError> {
        let reply = self.full_mapping()?;
        let per = usize::from(reply.keysyms_per_keycode);
        if per == 0 {
            return Ok(Vec::new());
        }
        Ok(self
            .keycode_range()
            .zip(reply.keysyms.chunks(per))
            .map(|(keycode, row)| (keycode, row.to_vec()))
            .collect())
    }

    fn full_mapping(&self) -> Result<GetKeyboardMappingReply, ProtocolError> {
        let count = self
            .max_keycode
            .saturating_sub(self.min_keycode)
            .saturating_add(1);
        self.conn
            .get_keyboard_mapping(self.min_keycode, count)
            .map_err(connection_error)?
            .reply()
            .map_err(reply_error)
    }
}

impl<C: Connection> KeyboardMapping for X11Keyboard<C> {
    fn keycodes_for_keysym(&self, keysym: Keysym) -> Result<Vec<KeyLocation>, ProtocolError> {
        let reply = self.full_mapping()?;
        Ok(slots_for_keysym(
            &reply.keysyms,
            reply.keysyms_per_keycode,
            self.min_keycode,
            keysym,
        ))
    }

    fn keysyms_for_keycode(&self, keycode: Keycode) -> Result<Vec<Keysym>, ProtocolError> {
        check_range(keycode, self.min_keycode, self.max_keycode)?;
        let reply = self
            .conn
            .get_keyboard_mapping(keycode, 1)
            .map_err(connection_error)?
            .reply()
            .map_err(reply_error)?;
        Ok(reply.keysyms)
    }

    fn set_keysyms(&mut self, keycode: Keycode, keysyms: &[Keysym]) -> Result<(), ProtocolError> {
        check_range(keycode, self.min_keycode, self.max_keycode)?;
        // A zero-width row is a BadValue; clear the key with one NoSymbol instead.
        let keysyms = if keysyms.is_empty() {
            &[NO_SYMBOL][..]
        } else {
            keysyms
        };
        let per = u8::try_from(keysyms.len()).map_err(|_| {
            ProtocolError::Request(format!(
                "{} keysyms for keycode {keycode} exceed the per-keycode limit",
                keysyms.len()
            ))
        })?;
        self.conn
            .change_keyboard_mapping(1, keycode, per, keysyms)
            .map_err(connection_error)?
            .check()
            .map_err(reply_error)?;
        debug!(keycode, keysyms_per_keycode = per, "keyboard mapping row sent");
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ProtocolError> {
        self.conn.flush().map_err(connection_error)
    }
}

/// Opens `display` and runs `body` inside a scoped [`MappingSession`].
///
/// Staged edits are flushed when `body` succeeds and discarded when it fails.
///
/// # Errors
///
/// A connection failure (as [`MappingError::Protocol`]), the error from
/// `body`, or a flush failure.
pub fn with_default_session<T, E, F>(
    display: Option<&str>,
    resolver: GlyphResolver,
    body: F,
) -> Result<T, E>
where
    E: From<MappingError>,
    F: FnOnce(&mut MappingSession<X11Keyboard>) -> Result<T, E>,
{
    let keyboard = X11Keyboard::<RustConnection>::connect(display).map_err(MappingError::from)?;
    with_session(keyboard, resolver, body)
}

/// Finds every slot holding `keysym` in a flat GetKeyboardMapping reply.
///
/// Results are ordered by level first, then keycode, so the first entry is
/// the key a user reaches with the fewest modifiers.
pub fn slots_for_keysym(
    keysyms: &[Keysym],
    keysyms_per_keycode: u8,
    first_keycode: Keycode,
    keysym: Keysym,
) -> Vec<KeyLocation> {
    let per = usize::from(keysyms_per_keycode);
    if per == 0 || keysym == NO_SYMBOL {
        return Vec::new();
    }
    let mut slots: Vec<KeyLocation> = keysyms
        .chunks(per)
        .enumerate()
        .flat_map(|(row, syms)| {
            syms.iter()
                .enumerate()
                .filter(move |&(_, &sym)| sym == keysym)
                .filter_map(move |(level, _)| {
                    let keycode = u8::try_from(usize::from(first_keycode) + row).ok()?;
                    let level = u8::try_from(level).ok()?;
                    Some(KeyLocation::at(keycode, ModifierLevel::new(level)))
                })
        })
        .collect();
    slots.sort_by_key(|slot| (slot.modifier_level, slot.keycode));
    slots
}

fn check_range(keycode: Keycode, min: Keycode, max: Keycode) -> Result<(), ProtocolError> {
    if (min..=max).contains(&keycode) {
        Ok(())
    } else {
        Err(ProtocolError::KeycodeOutOfRange { keycode, min, max })
    }
}

fn connection_error(e: ConnectionError) -> ProtocolError {
    ProtocolError::Connection(e.to_string())
}

fn reply_error(e: ReplyError) -> ProtocolError {
    match e {
        ReplyError::ConnectionError(e) => connection_error(e),
        ReplyError::X11Error(e) => ProtocolError::Request(format!(
            "{:?} error (bad value {:#x})",
            e.error_kind, e.bad_value
        )),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
