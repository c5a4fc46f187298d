//! Value types shared by every layer of glyphmap.
//!
//! Nothing in here talks to the display server.  A [`location::KeyLocation`]
//! only *names* a slot; the session decides what to do with it.

/// Physical key locations and modifier levels.
pub mod location;
