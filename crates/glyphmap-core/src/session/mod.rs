//! Staged keyboard-mapping sessions.
//!
//! # How a remap reaches the display server (for beginners)
//!
//! The X server only accepts *whole rows* of the keyboard table: a
//! ChangeKeyboardMapping request replaces every keysym of a keycode at once.
//! Editing a single slot therefore means "read the row, change one cell,
//! write the row back".  A [`mapping::MappingSession`] does the reading once
//! per keycode, keeps all edits in memory, and writes each touched row
//! exactly once when flushed:
//!
//! ```text
//! assign(38 level 4, 'æ') ─┐
//! assign(38 level 5, 'Æ') ─┼─▶ pending {38: [a, A, a, A, æ, Æ]} ─flush─▶ set_keysyms(38, ..) + flush()
//! assign(26 level 4, '€') ─┘          {26: [e, E, e, E, €, ¢]}          set_keysyms(26, ..)
//! ```
//!
//! The display server itself sits behind the [`provider::KeyboardMapping`]
//! trait so the session can be tested without an X server.

pub mod mapping;
pub mod provider;
