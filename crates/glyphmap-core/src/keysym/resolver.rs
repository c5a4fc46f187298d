//! Glyph to keysym resolution.

use std::sync::Arc;

use thiserror::Error;

use super::table::KeysymTable;
use super::UNICODE_KEYSYM_OFFSET;
use crate::domain::location::Keysym;

/// Error for textual glyph input that is not exactly one character.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GlyphError {
    #[error("glyph is empty")]
    Empty,
    #[error("glyph {0:?} must be a single character")]
    MultipleChars(String),
}

/// Resolves characters to keysyms using a shared [`KeysymTable`].
///
/// Cloning is cheap; clones share the same table.
#[derive(Debug, Clone)]
pub struct GlyphResolver {
    table: Arc<KeysymTable>,
}

impl GlyphResolver {
    /// Creates a resolver backed by `table`.
    pub fn new(table: Arc<KeysymTable>) -> Self {
        Self { table }
    }

    /// The table consulted for legacy code points.
    pub fn table(&self) -> &KeysymTable {
        &self.table
    }

    /// Returns the keysym for `glyph`.
    ///
    /// Legacy code points come from the table; all others are
    /// `code point + 0x01000000`.  Never fails.
    pub fn resolve(&self, glyph: char) -> Keysym {
        let code_point = u32::from(glyph);
        self.table
            .get(code_point)
            .unwrap_or(code_point + UNICODE_KEYSYM_OFFSET)
    }

    /// Returns the character a keysym produces, if it stands for one.
    ///
    /// Legacy keysyms are looked up in the table; keysyms in the Unicode
    /// range map back by removing the offset.  Function keysyms such as
    /// `Return` have no glyph.
    pub fn glyph_for(&self, keysym: Keysym) -> Option<char> {
        if let Some(code_point) = self.table.code_point_for(keysym) {
            return char::from_u32(code_point);
        }
        keysym
            .checked_sub(UNICODE_KEYSYM_OFFSET)
            .and_then(char::from_u32)
    }

    /// Resolves a string that must contain exactly one character.
    ///
    /// # Errors
    ///
    /// Returns [`GlyphError`] for an empty string or more than one character.
    pub fn resolve_str(&self, glyph: &str) -> Result<Keysym, GlyphError> {
        single_char(glyph).map(|c| self.resolve(c))
    }
}

impl Default for GlyphResolver {
    /// A resolver over the process-wide bundled table.
    fn default() -> Self {
        Self::new(KeysymTable::shared())
    }
}

/// Extracts the only character of `glyph`.
///
/// # Errors
///
/// Returns [`GlyphError`] unless `glyph` holds exactly one `char`.
pub fn single_char(glyph: &str) -> Result<char, GlyphError> {
    let mut chars = glyph.chars();
    match (chars.next(), chars.next()) {
        (None, _) => Err(GlyphError::Empty),
        (Some(c), None) => Ok(c),
        (Some(_), Some(_)) => Err(GlyphError::MultipleChars(glyph.to_string())),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
