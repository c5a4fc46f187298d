//! Unicode to X11 keysym translation.
//!
//! Every Unicode scalar value has a keysym.  A small set of legacy
//! characters use the historic assignments held in [`table::KeysymTable`];
//! everything else is `0x01000000 + code point`.

pub mod resolver;
pub mod table;

pub use resolver::GlyphResolver;
pub use table::KeysymTable;

/// Offset X11 adds to a Unicode code point to form its keysym.
pub const UNICODE_KEYSYM_OFFSET: u32 = 0x0100_0000;

/// The keysym of an empty slot in a keycode's keysym list.
pub const NO_SYMBOL: u32 = 0;
