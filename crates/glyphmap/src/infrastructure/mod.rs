//! Infrastructure layer for glyphmap.
//!
//! Contains the adapters behind `glyphmap_core::KeyboardMapping` and the
//! on-disk configuration.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `glyphmap_core`, but MUST NOT be imported by `glyphmap_core`.
//!
//! # Sub-modules
//!
//! - **`x11`** – `X11Keyboard`, the x11rb-backed connection used in
//!   production, plus `with_default_session` which opens `$DISPLAY`.
//!
//! - **`mock`** – `MockKeyboard`, an in-memory keyboard table that records
//!   every write.  Used by unit and integration tests.
//!
//! - **`storage`** – TOML configuration file handling.

pub mod mock;
pub mod storage;
pub mod x11;
