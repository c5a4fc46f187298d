//! In-memory keyboard mapping for tests.
//!
//! # Why a mock keyboard?
//!
//! The real adapter (`X11Keyboard`) talks to a running X server, which:
//!
//! - Is not available in CI containers.
//! - Would change the developer's actual keyboard layout when tests run.
//!
//! `MockKeyboard` keeps the mapping table in a `BTreeMap` and records every
//! `set_keysyms` and `flush` call so assertions can inspect exactly what
//! would have been sent.  It answers `keycodes_for_keysym` the same way the
//! X11 adapter does (ordered by level, then keycode), so session behaviour
//! observed against the mock matches the real server.
//!
//! # `should_fail` flag
//!
//! Set `should_fail = true` to make every call return
//! `ProtocolError::Connection`, for exercising error paths.

use std::collections::BTreeMap;

use glyphmap_core::{KeyLocation, KeyboardMapping, Keycode, Keysym, ModifierLevel, ProtocolError};

/// Smallest keycode the core protocol allows.
pub const MIN_KEYCODE: Keycode = 8;

/// A keyboard mapping table held in memory.
#[derive(Debug, Clone, Default)]
pub struct MockKeyboard {
    /// Current keysym list per keycode.  Keycodes not present read as empty.
    pub layout: BTreeMap<Keycode, Vec<Keysym>>,
    /// Every `(keycode, keysyms)` pair passed to `set_keysyms`, in call order.
    pub set_calls: Vec<(Keycode, Vec<Keysym>)>,
    /// Number of `flush` calls.
    pub flush_count: usize,
    /// When `true`, every method returns a connection error.
    pub should_fail: bool,
}

impl MockKeyboard {
    /// Creates an empty keyboard with no keys mapped.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a keyboard from `(keycode, keysyms)` rows.
    pub fn with_layout<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (Keycode, Vec<Keysym>)>,
    {
        Self {
            layout: rows.into_iter().collect(),
            ..Self::default()
        }
    }

    /// A small US-style layout with AltGr slots left empty.
    ///
    /// | keycode | keys      |
    /// |---------|-----------|
    /// | 10      | `1` `!`   |
    /// | 24      | `q` `Q`   |
    /// | 25      | `w` `W`   |
    /// | 26      | `e` `E`   |
    /// | 38      | `a` `A`   |
    /// | 65      | space     |
    pub fn sample_layout() -> Self {
        Self::with_layout([
            (10, vec![0x31, 0x21, 0x31, 0x21]),
            (24, vec![0x71, 0x51, 0x71, 0x51]),
            (25, vec![0x77, 0x57, 0x77, 0x57]),
            (26, vec![0x65, 0x45, 0x65, 0x45]),
            (38, vec![0x61, 0x41, 0x61, 0x41]),
            (65, vec![0x20, 0x20, 0x20, 0x20]),
        ])
    }

    fn check(&self, keycode: Option<Keycode>) -> Result<(), ProtocolError> {
        if self.should_fail {
            return Err(ProtocolError::Connection("mock failure".into()));
        }
        match keycode {
            Some(keycode) if keycode < MIN_KEYCODE => Err(ProtocolError::KeycodeOutOfRange {
                keycode,
                min: MIN_KEYCODE,
                max: Keycode::MAX,
            }),
            _ => Ok(()),
        }
    }
}

impl KeyboardMapping for MockKeyboard {
    fn keycodes_for_keysym(&self, keysym: Keysym) -> Result<Vec<KeyLocation>, ProtocolError> {
        self.check(None)?;
        let mut slots: Vec<KeyLocation> = self
            .layout
            .iter()
            .flat_map(|(&keycode, keysyms)| {
                keysyms
                    .iter()
                    .enumerate()
                    .filter(move |&(_, &sym)| sym == keysym)
                    .filter_map(move |(level, _)| {
                        let level = u8::try_from(level).ok()?;
                        Some(KeyLocation::at(keycode, ModifierLevel::new(level)))
                    })
            })
            .collect();
        slots.sort_by_key(|slot| (slot.modifier_level, slot.keycode));
        Ok(slots)
    }

    fn keysyms_for_keycode(&self, keycode: Keycode) -> Result<Vec<Keysym>, ProtocolError> {
        self.check(Some(keycode))?;
        Ok(self.layout.get(&keycode).cloned().unwrap_or_default())
    }

    fn set_keysyms(&mut self, keycode: Keycode, keysyms: &[Keysym]) -> Result<(), ProtocolError> {
        self.check(Some(keycode))?;
        self.set_calls.push((keycode, keysyms.to_vec()));
        self.layout.insert(keycode, keysyms.to_vec());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ProtocolError> {
        self.check(None)?;
        self.flush_count += 1;
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keycodes_for_keysym_orders_by_level_then_keycode() {
        let keyboard = MockKeyboard::with_layout([
            (40, vec![0x61]),
            (38, vec![0x62, 0x61]),
            (30, vec![0x63, 0x61]),
        ]);

        let slots = keyboard.keycodes_for_keysym(0x61).unwrap();

        assert_eq!(
            slots,
            vec![
                KeyLocation::new(40),
                KeyLocation::at(30, ModifierLevel::SHIFT),
                KeyLocation::at(38, ModifierLevel::SHIFT),
            ]
        );
    }

    #[test]
    fn test_unknown_keycode_reads_as_empty_list() {
        let keyboard = MockKeyboard::sample_layout();
        assert_eq!(keyboard.keysyms_for_keycode(200).unwrap(), Vec::<Keysym>::new());
    }

    #[test]
    fn test_set_keysyms_records_call_and_updates_layout() {
        let mut keyboard = MockKeyboard::sample_layout();

        keyboard.set_keysyms(38, &[0x71, 0x51]).unwrap();

        assert_eq!(keyboard.set_calls, vec![(38, vec![0x71, 0x51])]);
        assert_eq!(keyboard.layout[&38], vec![0x71, 0x51]);
    }

    #[test]
    fn test_keycode_below_minimum_is_rejected() {
        let keyboard = MockKeyboard::new();
        let err = keyboard.keysyms_for_keycode(3).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::KeycodeOutOfRange {
                keycode: 3,
                min: 8,
                max: 255
            }
        );
    }

    #[test]
    fn test_should_fail_makes_every_call_fail() {
        let mut keyboard = MockKeyboard::sample_layout();
        keyboard.should_fail = true;

        assert!(keyboard.keycodes_for_keysym(0x61).is_err());
        assert!(keyboard.keysyms_for_keycode(38).is_err());
        assert!(keyboard.set_keysyms(38, &[]).is_err());
        assert!(keyboard.flush().is_err());
        assert!(keyboard.set_calls.is_empty());
        assert_eq!(keyboard.flush_count, 0);
    }
}
