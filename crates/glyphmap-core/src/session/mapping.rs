//! MappingSession: locates glyphs, stages edits, flushes them per keycode.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::provider::{KeyboardMapping, ProtocolError};
use crate::domain::location::{KeyLocation, Keycode, Keysym};
use crate::keysym::resolver::GlyphResolver;
use crate::keysym::NO_SYMBOL;

/// ChangeKeyboardMapping carries the list length in a single byte.
const MAX_KEYSYMS_PER_KEYCODE: usize = u8::MAX as usize;

/// Error type for session operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MappingError {
    /// No keycode currently produces the glyph's keysym.
    #[error("glyph {glyph:?} (keysym {keysym:#x}) is not produced by any keycode")]
    UnmappedKeysym { glyph: char, keysym: Keysym },

    /// The level cannot be addressed by a ChangeKeyboardMapping request.
    #[error("modifier level {level} exceeds the keysym list limit")]
    LevelOutOfRange { level: u8 },

    /// The display server connection failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// A batch of keyboard remapping edits bound to one display connection.
///
/// A session is owned by one caller and is not shared across threads.
pub struct MappingSession<P> {
    provider: P,
    resolver: GlyphResolver,
    pending: BTreeMap<Keycode, Vec<Keysym>>,
}

impl<P: KeyboardMapping> MappingSession<P> {
    /// Creates a session with no staged edits.
    pub fn new(provider: P, resolver: GlyphResolver) -> Self {
        Self {
            provider,
            resolver,
            pending: BTreeMap::new(),
        }
    }

    /// The resolver used for glyph lookups.
    pub fn resolver(&self) -> &GlyphResolver {
        &self.resolver
    }

    /// Read access to the underlying connection.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Finds the key that currently produces `glyph`.
    ///
    /// The returned location names the key only (level 0), even when the
    /// glyph sits on a shifted slot.
    ///
    /// # Errors
    ///
    /// [`MappingError::UnmappedKeysym`] if no keycode produces the glyph;
    /// [`MappingError::Protocol`] if the query fails.  Nothing is staged.
    pub fn locate(&self, glyph: char) -> Result<KeyLocation, MappingError> {
        let keysym = self.resolver.resolve(glyph);
        let slots = self.provider.keycodes_for_keysym(keysym)?;
        let location = slots
            .first()
            .map(|slot| KeyLocation::new(slot.keycode))
            .ok_or(MappingError::UnmappedKeysym { glyph, keysym })?;
        debug!(?glyph, keysym = format_args!("{keysym:#x}"), %location, "located glyph");
        Ok(location)
    }

    /// Stages `glyph` into the slot named by `location`.
    ///
    /// The first edit to a keycode copies its current keysym list from the
    /// server so unrelated levels survive the flush.  A level past the end of
    /// the list pads the gap with `NoSymbol`.
    ///
    /// # Errors
    ///
    /// [`MappingError::LevelOutOfRange`] for level 255;
    /// [`MappingError::Protocol`] if the current list cannot be fetched.
    pub fn assign(&mut self, location: KeyLocation, glyph: char) -> Result<(), MappingError> {
        let level = usize::from(location.modifier_level.level());
        if level >= MAX_KEYSYMS_PER_KEYCODE {
            return Err(MappingError::LevelOutOfRange {
                level: location.modifier_level.level(),
            });
        }
        let keysym = self.resolver.resolve(glyph);

        let keysyms = match self.pending.entry(location.keycode) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let current = self.provider.keysyms_for_keycode(location.keycode)?;
                entry.insert(current)
            }
        };
        if keysyms.len() <= level {
            keysyms.resize(level + 1, NO_SYMBOL);
        }
        keysyms[level] = keysym;

        debug!(?glyph, keysym = format_args!("{keysym:#x}"), %location, "staged assignment");
        Ok(())
    }

    /// Writes every staged keycode, then asks the server to apply them.
    ///
    /// One `set_keysyms` call per keycode in ascending order, followed by a
    /// single `flush`.  Staged edits are cleared only when all calls succeed.
    ///
    /// # Errors
    ///
    /// [`MappingError::Protocol`] from the first failing call.  Keycodes
    /// already written are not rolled back.
    pub fn flush(&mut self) -> Result<(), MappingError> {
        for (&keycode, keysyms) in &self.pending {
            self.provider.set_keysyms(keycode, keysyms)?;
        }
        self.provider.flush()?;

        info!(keycodes = self.pending.len(), "keyboard mapping flushed");
        self.pending.clear();
        Ok(())
    }

    /// Staged keysym lists by keycode.
    pub fn pending(&self) -> &BTreeMap<Keycode, Vec<Keysym>> {
        &self.pending
    }

    /// Returns `true` if any edit is staged.
    pub fn is_dirty(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Drops all staged edits without touching the server.
    pub fn discard(&mut self) {
        self.pending.clear();
    }

    /// Ends the session, returning the connection.  Staged edits are dropped.
    pub fn into_inner(self) -> P {
        self.provider
    }
}

/// Runs `body` inside a session and flushes when it succeeds.
///
/// If `body` returns an error, staged edits are discarded and the error is
/// returned unchanged; nothing is flushed.
///
/// # Errors
///
/// The error from `body`, or the flush failure converted into `E`.
pub fn with_session<P, T, E, F>(provider: P, resolver: GlyphResolver, body: F) -> Result<T, E>
where
    P: KeyboardMapping,
    E: From<MappingError>,
    F: FnOnce(&mut MappingSession<P>) -> Result<T, E>,
{
    let mut session = MappingSession::new(provider, resolver);
    match body(&mut session) {
        Ok(value) => {
            session.flush()?;
            Ok(value)
        }
        Err(e) => {
            if session.is_dirty() {
                warn!(
                    keycodes = session.pending().len(),
                    "session failed; discarding staged edits"
                );
            }
            session.discard();
            Err(e)
        }
    }
}

impl<P: KeyboardMapping + ?Sized> KeyboardMapping for &mut P {
    fn keycodes_for_keysym(&self, keysym: Keysym) -> Result<Vec<KeyLocation>, ProtocolError> {
        (**self).keycodes_for_keysym(keysym)
    }

    fn keysyms_for_keycode(&self, keycode: Keycode) -> Result<Vec<Keysym>, ProtocolError> {
        (**self).keysyms_for_keycode(keycode)
    }

    fn set_keysyms(&mut self, keycode: Keycode, keysyms: &[Keysym]) -> Result<(), ProtocolError> {
        (**self).set_keysyms(keycode, keysyms)
    }

    fn flush(&mut self) -> Result<(), ProtocolError> {
        (**self).flush()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
