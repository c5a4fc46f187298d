//! Application layer use cases for the glyphmap tool.
//!
//! # What use cases does glyphmap have?
//!
//! - **`remap`** – Applies one or many glyph placements.  A [`remap::RemapPlan`]
//!   is validated in full before the display is touched, then every entry is
//!   staged in a single `MappingSession` and flushed once.  The keyboard
//!   collaborator is injected, so the same code runs against X11 and the
//!   in-memory mock.
//!
//! - **`lookup`** – Read-only queries: which glyph each slot of a keycode
//!   produces, for `glyphmap dump`.

pub mod lookup;
pub mod remap;
