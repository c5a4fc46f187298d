//! Key location and modifier level value types.
//!
//! # Keycodes, keysyms and levels (for beginners)
//!
//! The X server describes the keyboard as a table.  Each row is a *keycode*
//! (a physical key, numbered 8..=255) and each column is a *level*.  The cell
//! holds the *keysym* produced when that key is pressed with the modifiers
//! selecting that level:
//!
//! | keycode | level 0 | level 1 | level 2 | level 3 | level 4 (AltGr) | level 5 |
//! |---------|---------|---------|---------|---------|-----------------|---------|
//! | 38      | `a`     | `A`     | `a`     | `A`     | `ae`            | `AE`    |
//!
//! The column positions are a convention of the common xkb layouts, not a
//! protocol guarantee.  Shift selects the odd column, AltGr moves four
//! columns right; that is why [`ModifierLevel::combine`] simply adds levels.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A physical key number as used by the X11 core protocol.
pub type Keycode = u8;

/// An X11 keysym value.
pub type Keysym = u32;

/// Index into a keycode's keysym list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModifierLevel(u8);

impl ModifierLevel {
    /// No modifier held.
    pub const BASE: ModifierLevel = ModifierLevel(0);
    /// Shift held.
    pub const SHIFT: ModifierLevel = ModifierLevel(1);
    /// AltGr (ISO level 3 shift) held.
    pub const ALT_GR: ModifierLevel = ModifierLevel(4);

    /// Creates a level from a raw keysym-list index.
    pub const fn new(level: u8) -> Self {
        Self(level)
    }

    /// Returns the raw keysym-list index.
    pub const fn level(self) -> u8 {
        self.0
    }

    /// Combines two levels into the slot reached by holding both modifiers.
    ///
    /// `combine(SHIFT, ALT_GR)` is level 5.  The result saturates at 255, the
    /// largest index the protocol can address.
    pub const fn combine(a: ModifierLevel, b: ModifierLevel) -> ModifierLevel {
        ModifierLevel(a.0.saturating_add(b.0))
    }
}

impl fmt::Display for ModifierLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::BASE => write!(f, "base"),
            Self::SHIFT => write!(f, "shift"),
            Self::ALT_GR => write!(f, "altgr"),
            Self(5) => write!(f, "shift+altgr"),
            Self(n) => write!(f, "{n}"),
        }
    }
}

/// Error returned when a modifier level name cannot be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown modifier level {0:?} (expected base, shift, altgr, a `+` combination, or an index)")]
pub struct ParseLevelError(pub String);

impl FromStr for ModifierLevel {
    type Err = ParseLevelError;

    /// Parses `base`, `shift`, `altgr`, `+`-joined combinations such as
    /// `shift+altgr`, or a plain decimal index.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(n) = trimmed.parse::<u8>() {
            return Ok(Self(n));
        }
        trimmed
            .split('+')
            .map(|part| match part.trim().to_ascii_lowercase().as_str() {
                "base" | "none" => Ok(Self::BASE),
                "shift" => Ok(Self::SHIFT),
                "altgr" | "alt-gr" | "alt_gr" => Ok(Self::ALT_GR),
                _ => Err(ParseLevelError(s.to_string())),
            })
            .try_fold(Self::BASE, |acc, level| level.map(|l| Self::combine(acc, l)))
    }
}

/// A physical key, optionally narrowed to one slot of its keysym list.
///
/// Two locations are equal when both keycode and level match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyLocation {
    pub keycode: Keycode,
    pub modifier_level: ModifierLevel,
}

impl KeyLocation {
    /// Location of the key itself (level 0).
    pub const fn new(keycode: Keycode) -> Self {
        Self {
            keycode,
            modifier_level: ModifierLevel::BASE,
        }
    }

    /// Location of a specific slot on a key.
    pub const fn at(keycode: Keycode, modifier_level: ModifierLevel) -> Self {
        Self {
            keycode,
            modifier_level,
        }
    }

    /// Returns this location moved by `modifier` levels on the same key.
    pub const fn with_modifier(self, modifier: ModifierLevel) -> Self {
        Self {
            keycode: self.keycode,
            modifier_level: ModifierLevel::combine(self.modifier_level, modifier),
        }
    }
}

impl fmt::Display for KeyLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "keycode {} level {}", self.keycode, self.modifier_level)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
