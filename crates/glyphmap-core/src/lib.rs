//! # glyphmap-core
//!
//! Shared library for glyphmap containing the keysym lookup table, the
//! glyph-to-keysym resolver, key location value types, and the staged
//! keyboard-mapping session.
//!
//! It has zero dependencies on OS APIs or the X11 wire protocol.  The display
//! server is reached through the [`KeyboardMapping`] trait, implemented by the
//! `glyphmap` crate on top of `x11rb`.
//!
//! # Architecture overview (for beginners)
//!
//! A keyboard remap on X11 moves between three coordinate spaces:
//!
//! ```text
//! Unicode code point  ──GlyphResolver──▶  X11 keysym  ──KeyboardMapping──▶  keycode + level
//!       'ä' (U+00E4)                        0x00E4                           keycode 38, level 1
//! ```
//!
//! - **`keysym`** – The [`KeysymTable`] of legacy keysym assignments and the
//!   [`GlyphResolver`] that turns any `char` into a keysym.
//!
//! - **`domain`** – Plain value types: [`KeyLocation`] (a physical key plus a
//!   slot in its keysym list) and [`ModifierLevel`] (the slot index).
//!
//! - **`session`** – The [`MappingSession`]: looks up where a glyph lives,
//!   stages edits per keycode, and flushes them to the display server in one
//!   batch.

pub mod domain;
pub mod keysym;
pub mod session;

pub use domain::location::{KeyLocation, Keycode, Keysym, ModifierLevel, ParseLevelError};
pub use keysym::resolver::{single_char, GlyphError, GlyphResolver};
pub use keysym::{NO_SYMBOL, UNICODE_KEYSYM_OFFSET};
pub use keysym::table::{DataFormatError, KeysymTable};
pub use session::mapping::{with_session, MappingError, MappingSession};
pub use session::provider::{KeyboardMapping, ProtocolError};
