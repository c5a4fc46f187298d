//! glyphmap library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does glyphmap do? (for beginners)
//!
//! glyphmap puts characters onto keys.  Given "put `æ` on AltGr+a", it:
//!
//! 1. Resolves `a` and `æ` to X11 keysyms (see `glyphmap_core::GlyphResolver`).
//! 2. Asks the X server which keycode currently produces `a`.
//! 3. Copies that keycode's keysym list, writes `æ` into the AltGr slot.
//! 4. Sends the whole row back with ChangeKeyboardMapping and flushes.
//!
//! Edits can come one at a time from the CLI or in bulk from a TOML remap
//! plan; either way they are applied through one `MappingSession`.

/// Application layer: remap and lookup use cases.
pub mod application;

/// Infrastructure layer: X11 adapter, in-memory mock, and configuration.
pub mod infrastructure;
