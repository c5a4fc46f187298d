//! Legacy keysym lookup table.
//!
//! Before X11 reserved `0x01000000 + code point` for Unicode, keysyms were
//! assigned block by block (Latin 1 at `0x00xx`, Latin 2 at `0x01xx`, Greek at
//! `0x07xx`, ...).  Those assignments do not follow any arithmetic rule, so
//! they are read from a reference dataset in the `keysyms.txt` format:
//!
//! ```text
//! # comment
//! 0x01a1 U0104 . # Aogonek
//! 0xff08 U0008 f # BackSpace
//! ```
//!
//! Only records whose third field is the `.` marker are kept.  Comments,
//! blank lines and any line that does not have the `0x<hex> U<hex> .` shape
//! are skipped silently; a line that has the shape but carries non-hex digits
//! is a [`DataFormatError::InvalidRecord`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use thiserror::Error;
use tracing::debug;

use crate::domain::location::Keysym;

/// The dataset compiled into the crate.
const BUNDLED_KEYSYMS: &str = include_str!("../../data/keysyms.txt");

/// Marker field identifying a keysym/code point equivalence.
const EQUIVALENCE_MARKER: &str = ".";

/// Error type for loading a keysym table.
#[derive(Debug, Error)]
pub enum DataFormatError {
    /// The dataset file could not be read.
    #[error("could not read keysym table at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A record-shaped line carried a field that is not hexadecimal.
    #[error("invalid keysym record on line {line}: {reason}")]
    InvalidRecord { line: usize, reason: String },
}

/// Immutable mapping from Unicode code point to legacy keysym.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeysymTable {
    by_code_point: HashMap<u32, Keysym>,
    by_keysym: HashMap<Keysym, u32>,
}

impl KeysymTable {
    /// Reads and parses a dataset file.
    ///
    /// # Errors
    ///
    /// Returns [`DataFormatError::Io`] if the file is missing or unreadable,
    /// and [`DataFormatError::InvalidRecord`] for a malformed record.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DataFormatError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| DataFormatError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::parse(&text)?;
        debug!(path = %path.display(), entries = table.len(), "keysym table loaded");
        Ok(table)
    }

    /// Parses a dataset held in memory.
    ///
    /// When a code point appears more than once the last record wins, and
    /// the keysyms it overrode get no reverse entry.
    ///
    /// # Errors
    ///
    /// Returns [`DataFormatError::InvalidRecord`] for a record-shaped line
    /// whose keysym or code point is not hexadecimal.
    pub fn parse(text: &str) -> Result<Self, DataFormatError> {
        let mut by_code_point = HashMap::new();
        let mut records = Vec::new();

        for (index, line) in text.lines().enumerate() {
            let line_no = index + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let mut fields = trimmed.split_whitespace();
            let (Some(keysym_field), Some(code_point_field), Some(marker)) =
                (fields.next(), fields.next(), fields.next())
            else {
                continue;
            };
            let (Some(keysym_hex), Some(code_point_hex)) = (
                keysym_field.strip_prefix("0x"),
                code_point_field.strip_prefix('U'),
            ) else {
                continue;
            };
            if marker != EQUIVALENCE_MARKER {
                continue;
            }

            let keysym = parse_hex(keysym_hex).ok_or_else(|| DataFormatError::InvalidRecord {
                line: line_no,
                reason: format!("keysym {keysym_field:?} is not hexadecimal"),
            })?;
            let code_point =
                parse_hex(code_point_hex).ok_or_else(|| DataFormatError::InvalidRecord {
                    line: line_no,
                    reason: format!("code point {code_point_field:?} is not hexadecimal"),
                })?;

            by_code_point.insert(code_point, keysym);
            records.push((keysym, code_point));
        }

        // Reverse entries come only from records that survived in the
        // forward map, first one per keysym.
        let mut by_keysym = HashMap::new();
        for (keysym, code_point) in records {
            if by_code_point.get(&code_point) == Some(&keysym) {
                by_keysym.entry(keysym).or_insert(code_point);
            }
        }

        Ok(Self {
            by_code_point,
            by_keysym,
        })
    }

    /// Parses the dataset bundled with this crate.
    pub fn bundled() -> Self {
        // The bundled dataset is checked by the unit tests below, so parsing
        // it cannot fail at runtime.
        Self::parse(BUNDLED_KEYSYMS).expect("bundled keysym table is well-formed")
    }

    /// Returns the process-wide bundled table, parsing it on first use.
    pub fn shared() -> Arc<Self> {
        static SHARED: OnceLock<Arc<KeysymTable>> = OnceLock::new();
        Arc::clone(SHARED.get_or_init(|| Arc::new(Self::bundled())))
    }

    /// Looks up the legacy keysym for `code_point`.
    ///
    /// `None` is the normal answer for any code point without a legacy
    /// assignment.
    pub fn get(&self, code_point: u32) -> Option<Keysym> {
        self.by_code_point.get(&code_point).copied()
    }

    /// Reverse lookup: the code point a legacy keysym stands for.
    ///
    /// If several records share a keysym the first one in the dataset wins.
    /// A keysym whose only record was overridden by a later record for the
    /// same code point has no reverse entry, so `get(code_point_for(k)?)`
    /// always returns `k`.
    pub fn code_point_for(&self, keysym: Keysym) -> Option<u32> {
        self.by_keysym.get(&keysym).copied()
    }

    /// Number of code points in the table.
    pub fn len(&self) -> usize {
        self.by_code_point.len()
    }

    /// Returns `true` if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.by_code_point.is_empty()
    }

    /// Iterates over `(code_point, keysym)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, Keysym)> + '_ {
        self.by_code_point.iter().map(|(&cp, &sym)| (cp, sym))
    }
}

/// Parses a bare hexadecimal field.  Signs and empty strings are rejected.
fn parse_hex(digits: &str) -> Option<u32> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_record_maps_code_point_to_keysym() {
        let table = KeysymTable::parse("0x1B5 U00A1 .").unwrap();
        assert_eq!(table.get(0x00A1), Some(0x1B5));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_unrecognised_lines_are_skipped() {
        let text = "not a valid line\n0x01a1 U0104 . # Aogonek\n";
        let table = KeysymTable::parse(text).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(0x0104), Some(0x01a1));
    }

    #[test]
    fn test_comments_and_blank_lines_are_skipped() {
        let text = "# header\n\n   \n  # indented comment\n0x0041 U0041 . # A\n";
        let table = KeysymTable::parse(text).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_records_with_other_markers_are_skipped() {
        let text = "0xff08 U0008 f # BackSpace\n0x07ab U2015 d # deprecated\n";
        let table = KeysymTable::parse(text).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_short_lines_are_skipped() {
        let table = KeysymTable::parse("0x0041 U0041\n0x0041\n").unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_lines_without_prefixes_are_skipped() {
        let table = KeysymTable::parse("0041 U0041 .\n0x0041 0041 .\n").unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_non_hex_keysym_is_an_error() {
        let err = KeysymTable::parse("# ok\n0xZZ U0041 .\n").unwrap_err();
        match err {
            DataFormatError::InvalidRecord { line, .. } => assert_eq!(line, 2),
            other => panic!("expected InvalidRecord, got {other:?}"),
        }
    }

    #[test]
    fn test_non_hex_code_point_is_an_error() {
        let err = KeysymTable::parse("0x0041 Uxyz .\n").unwrap_err();
        assert!(matches!(err, DataFormatError::InvalidRecord { line: 1, .. }));
    }

    #[test]
    fn test_empty_hex_field_is_an_error() {
        assert!(KeysymTable::parse("0x U0041 .").is_err());
        assert!(KeysymTable::parse("0x0041 U .").is_err());
    }

    #[test]
    fn test_later_duplicate_wins() {
        let table = KeysymTable::parse("0x0001 U00A1 .\n0x0002 U00A1 .\n").unwrap();
        assert_eq!(table.get(0x00A1), Some(0x0002));
    }

    #[test]
    fn test_overridden_keysym_has_no_reverse_entry() {
        let table = KeysymTable::parse("0x0001 U00A1 .\n0x0002 U00A1 .\n").unwrap();

        assert_eq!(table.code_point_for(0x0001), None);
        assert_eq!(table.code_point_for(0x0002), Some(0x00A1));
    }

    #[test]
    fn test_reverse_lookup_skips_overridden_first_record() {
        // 0x0aa9 first names U+2014, but U+2014 is later reassigned; the
        // surviving U+2015 record becomes the reverse entry.
        let text = "0x0aa9 U2014 .\n0x0aa9 U2015 .\n0x0aaa U2014 .\n";
        let table = KeysymTable::parse(text).unwrap();

        assert_eq!(table.code_point_for(0x0aa9), Some(0x2015));
        assert_eq!(table.code_point_for(0x0aaa), Some(0x2014));
    }

    #[test]
    fn test_missing_code_point_returns_none() {
        let table = KeysymTable::parse("0x0041 U0041 .").unwrap();
        assert_eq!(table.get(0x20AC), None);
    }

    #[test]
    fn test_reverse_lookup_prefers_first_record() {
        let table = KeysymTable::parse("0x0aa9 U2014 .\n0x0aa9 U2015 .\n").unwrap();
        assert_eq!(table.code_point_for(0x0aa9), Some(0x2014));
        assert_eq!(table.code_point_for(0x0aaa), None);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = KeysymTable::load("/nonexistent/glyphmap/keysyms.txt").unwrap_err();
        assert!(matches!(err, DataFormatError::Io { .. }));
    }

    #[test]
    fn test_load_reads_file_from_disk() {
        // Arrange
        let dir = std::env::temp_dir().join(format!("glyphmap_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("keysyms.txt");
        std::fs::write(&path, "0x1B5 U00A1 .\n").unwrap();

        // Act
        let table = KeysymTable::load(&path).unwrap();

        // Assert
        assert_eq!(table.get(0x00A1), Some(0x1B5));

        // Cleanup
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_bundled_table_parses() {
        let table = KeysymTable::parse(BUNDLED_KEYSYMS).expect("bundled data must parse");
        assert!(table.len() > 900, "only {} records", table.len());
    }

    #[test]
    fn test_bundled_table_has_known_legacy_entries() {
        let table = KeysymTable::bundled();
        assert_eq!(table.get('Ą' as u32), Some(0x01a1));
        assert_eq!(table.get('α' as u32), Some(0x07e1));
        assert_eq!(table.get('€' as u32), Some(0x20ac));
        assert_eq!(table.get('ä' as u32), Some(0x00e4));
    }

    #[test]
    fn test_bundled_table_covers_every_legacy_block() {
        let table = KeysymTable::bundled();
        let cases = [
            ('Ĉ', 0x02c6), // Latin 3
            ('ā', 0x03e0), // Latin 4
            ('ア', 0x04b1), // Katakana
            ('ء', 0x05c1), // Arabic
            ('ж', 0x06d6), // Cyrillic
            ('Ω', 0x07d9), // Greek
            ('→', 0x08fd), // Technical
            ('—', 0x0aa9), // Publishing
            ('א', 0x0ce0), // Hebrew
            ('ก', 0x0da1), // Thai
            ('ㄱ', 0x0ea1), // Korean
            ('Œ', 0x13bc), // Latin 9
        ];
        for (glyph, keysym) in cases {
            assert_eq!(table.get(glyph as u32), Some(keysym), "{glyph:?}");
        }
    }

    #[test]
    fn test_bundled_reverse_map_agrees_with_forward_map() {
        let table = KeysymTable::bundled();
        for (code_point, keysym) in table.iter() {
            let back = table.code_point_for(keysym).unwrap();
            assert_eq!(table.get(back), Some(keysym), "{code_point:#x}");
        }
    }

    #[test]
    fn test_bundled_table_skips_function_keys() {
        let table = KeysymTable::bundled();
        assert_eq!(table.get(0x0008), None);
    }

    #[test]
    fn test_shared_table_is_a_single_instance() {
        let a = KeysymTable::shared();
        let b = KeysymTable::shared();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
