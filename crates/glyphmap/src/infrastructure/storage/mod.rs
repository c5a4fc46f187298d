//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module handles:
//!
//! - Reading the TOML configuration file from the XDG config directory.
//! - Writing a default file for `glyphmap init-config`.
//! - Providing sensible defaults when the file does not exist yet.

pub mod config;
