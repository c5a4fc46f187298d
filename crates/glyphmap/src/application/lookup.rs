//! Read-only keyboard queries used by `glyphmap dump` and `glyphmap locate`.

use std::fmt;

use glyphmap_core::{
    GlyphResolver, KeyLocation, KeyboardMapping, Keycode, Keysym, MappingError, ModifierLevel,
    NO_SYMBOL,
};

/// One occupied slot of a keycode's keysym list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotDescription {
    pub location: KeyLocation,
    pub keysym: Keysym,
    /// The character the keysym types, if it stands for one.
    pub glyph: Option<char>,
}

impl fmt::Display for SlotDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:#010x}", self.location, self.keysym)?;
        match self.glyph {
            Some(c) if !c.is_control() => write!(f, " {c:?}"),
            _ => Ok(()),
        }
    }
}

/// Describes the non-empty slots of one keysym list.
///
/// `NoSymbol` slots are skipped; the remaining slots keep their original
/// level numbers.
pub fn describe_row(
    resolver: &GlyphResolver,
    keycode: Keycode,
    keysyms: &[Keysym],
) -> Vec<SlotDescription> {
    keysyms
        .iter()
        .enumerate()
        .filter(|&(_, &keysym)| keysym != NO_SYMBOL)
        .filter_map(|(level, &keysym)| {
            let level = u8::try_from(level).ok()?;
            Some(SlotDescription {
                location: KeyLocation::at(keycode, ModifierLevel::new(level)),
                keysym,
                glyph: resolver.glyph_for(keysym),
            })
        })
        .collect()
}

/// Fetches and describes the current keysym list of `keycode`.
///
/// # Errors
///
/// [`MappingError::Protocol`] if the query fails.
pub fn describe_keycode<P: KeyboardMapping>(
    provider: &P,
    resolver: &GlyphResolver,
    keycode: Keycode,
) -> Result<Vec<SlotDescription>, MappingError> {
    let keysyms = provider.keysyms_for_keycode(keycode)?;
    Ok(describe_row(resolver, keycode, &keysyms))
}

/// Every slot currently producing `glyph`, fewest modifiers first.
///
/// # Errors
///
/// [`MappingError::Protocol`] if the query fails.
pub fn find_glyph<P: KeyboardMapping>(
    provider: &P,
    resolver: &GlyphResolver,
    glyph: char,
) -> Result<Vec<KeyLocation>, MappingError> {
    Ok(provider.keycodes_for_keysym(resolver.resolve(glyph))?)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
