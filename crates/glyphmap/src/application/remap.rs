//! RemapUseCase: places glyphs onto keys, one at a time or from a TOML plan.
//!
//! A remap plan lists placements:
//!
//! ```toml
//! [[remap]]
//! key = "a"          # the key that currently types `a`
//! level = "altgr"
//! glyph = "æ"
//!
//! [[remap]]
//! keycode = 26       # or address the key by number
//! level = 5          # shift+altgr
//! glyph = "€"
//! ```
//!
//! Every entry is checked before any request is sent, so a typo in the last
//! entry does not leave the keyboard half remapped.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use glyphmap_core::{
    single_char, with_session, GlyphError, GlyphResolver, KeyLocation, KeyboardMapping, Keycode,
    Keysym, MappingError, MappingSession, ModifierLevel, ParseLevelError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Error type for remap operations.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The plan file could not be read.
    #[error("could not read remap plan at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The plan is not valid TOML or has the wrong shape.
    #[error("failed to parse remap plan: {0}")]
    Parse(#[from] toml::de::Error),

    /// An entry names an unusable glyph, level, or target key.
    #[error("remap entry {index}: {reason}")]
    InvalidEntry { index: usize, reason: String },

    /// A glyph argument is not exactly one character.
    #[error(transparent)]
    Glyph(#[from] GlyphError),

    /// A level argument is not a known name or index.
    #[error(transparent)]
    Level(#[from] ParseLevelError),

    /// The keyboard mapping could not be queried or changed.
    #[error(transparent)]
    Mapping(#[from] MappingError),
}

// ── Plan schema ───────────────────────────────────────────────────────────────

/// A list of glyph placements loaded from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RemapPlan {
    #[serde(default)]
    pub remap: Vec<RemapEntry>,
}

/// One placement in a [`RemapPlan`].
///
/// Exactly one of `key` and `keycode` must be given.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemapEntry {
    /// A glyph the target key currently produces.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// The target key by number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keycode: Option<Keycode>,
    /// Slot on the target key.
    #[serde(default)]
    pub level: LevelSpec,
    /// The glyph to place.
    pub glyph: String,
}

/// A modifier level written either as an index or as a name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum LevelSpec {
    Index(u8),
    Name(String),
}

impl Default for LevelSpec {
    fn default() -> Self {
        Self::Index(ModifierLevel::BASE.level())
    }
}

impl LevelSpec {
    /// Converts to a [`ModifierLevel`].
    ///
    /// # Errors
    ///
    /// Returns [`ParseLevelError`] for an unknown name.
    pub fn to_level(&self) -> Result<ModifierLevel, ParseLevelError> {
        match self {
            Self::Index(n) => Ok(ModifierLevel::new(*n)),
            Self::Name(name) => name.parse(),
        }
    }
}

impl RemapPlan {
    /// Parses a plan from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Parse`] for malformed TOML.
    pub fn parse(text: &str) -> Result<Self, PlanError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a plan file.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Io`] if the file cannot be read, and
    /// [`PlanError::Parse`] for malformed TOML.
    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let text = std::fs::read_to_string(path).map_err(|source| PlanError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Checks every entry and converts it to an [`Edit`].
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidEntry`] for the first bad entry.  Indices
    /// are 1-based.
    pub fn validate(&self) -> Result<Vec<Edit>, PlanError> {
        self.remap
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                entry.to_edit().map_err(|reason| PlanError::InvalidEntry {
                    index: i + 1,
                    reason,
                })
            })
            .collect()
    }
}

impl RemapEntry {
    fn to_edit(&self) -> Result<Edit, String> {
        let target = match (&self.key, self.keycode) {
            (Some(key), None) => {
                Target::Key(single_char(key).map_err(|e| format!("key: {e}"))?)
            }
            (None, Some(keycode)) => Target::Keycode(keycode),
            (Some(_), Some(_)) => return Err("give either `key` or `keycode`, not both".into()),
            (None, None) => return Err("missing `key` or `keycode`".into()),
        };
        let level = self.level.to_level().map_err(|e| e.to_string())?;
        let glyph = single_char(&self.glyph).map_err(|e| format!("glyph: {e}"))?;
        Ok(Edit {
            target,
            level,
            glyph,
        })
    }
}

// ── Validated edits ───────────────────────────────────────────────────────────

/// How an edit names its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Whichever key currently produces this glyph.
    Key(char),
    /// A keycode.
    Keycode(Keycode),
}

/// A checked placement ready to stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edit {
    pub target: Target,
    pub level: ModifierLevel,
    pub glyph: char,
}

/// What an applied plan changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemapSummary {
    /// Number of slots assigned.
    pub edits: usize,
    /// Keycodes rewritten, ascending.
    pub keycodes: Vec<Keycode>,
}

// ── Use case ──────────────────────────────────────────────────────────────────

/// The Remap use case.
///
/// Holds the resolver; the keyboard collaborator is passed per call so a
/// single use case can serve both the X11 adapter and test doubles.
#[derive(Debug, Clone, Default)]
pub struct RemapUseCase {
    resolver: GlyphResolver,
}

impl RemapUseCase {
    /// Creates a use case with the given resolver.
    pub fn new(resolver: GlyphResolver) -> Self {
        Self { resolver }
    }

    /// The resolver used for glyphs and `key` targets.
    pub fn resolver(&self) -> &GlyphResolver {
        &self.resolver
    }

    /// Applies every entry of `plan` in one session and flushes once.
    ///
    /// Nothing is sent if validation fails, and nothing is flushed if any
    /// entry fails to stage.
    ///
    /// # Errors
    ///
    /// [`PlanError::InvalidEntry`] for a bad entry; [`PlanError::Mapping`]
    /// if a `key` target is unmapped or the display connection fails.
    pub fn apply_plan<P: KeyboardMapping>(
        &self,
        provider: P,
        plan: &RemapPlan,
    ) -> Result<RemapSummary, PlanError> {
        let edits = plan.validate()?;
        let summary = self.apply_edits(provider, &edits)?;
        info!(
            edits = summary.edits,
            keycodes = summary.keycodes.len(),
            "remap plan applied"
        );
        Ok(summary)
    }

    /// Applies already-validated edits in one session.
    ///
    /// # Errors
    ///
    /// [`PlanError::Mapping`] if staging or the final flush fails.
    pub fn apply_edits<P: KeyboardMapping>(
        &self,
        provider: P,
        edits: &[Edit],
    ) -> Result<RemapSummary, PlanError> {
        with_session(provider, self.resolver.clone(), |session| {
            stage_edits(session, edits)?;
            Ok(RemapSummary {
                edits: edits.len(),
                keycodes: session.pending().keys().copied().collect(),
            })
        })
    }

    /// Stages `plan` and returns the keysym lists that would be written,
    /// without flushing anything.
    ///
    /// # Errors
    ///
    /// As [`RemapUseCase::apply_plan`], minus flush failures.
    pub fn preview_plan<P: KeyboardMapping>(
        &self,
        provider: P,
        plan: &RemapPlan,
    ) -> Result<BTreeMap<Keycode, Vec<Keysym>>, PlanError> {
        let edits = plan.validate()?;
        let mut session = MappingSession::new(provider, self.resolver.clone());
        stage_edits(&mut session, &edits)?;
        let pending = session.pending().clone();
        session.discard();
        Ok(pending)
    }

    /// Places one glyph and flushes.
    ///
    /// `glyph` and a `Key` target must each be a single character.
    ///
    /// # Errors
    ///
    /// [`PlanError::Glyph`] for a bad glyph argument; otherwise as
    /// [`RemapUseCase::apply_edits`].
    pub fn assign_one<P: KeyboardMapping>(
        &self,
        provider: P,
        target: Target,
        level: ModifierLevel,
        glyph: &str,
    ) -> Result<KeyLocation, PlanError> {
        let glyph = single_char(glyph)?;
        with_session(provider, self.resolver.clone(), |session| {
            let location = stage(session, Edit {
                target,
                level,
                glyph,
            })?;
            Ok(location)
        })
    }
}

fn stage_edits<P: KeyboardMapping>(
    session: &mut MappingSession<P>,
    edits: &[Edit],
) -> Result<(), MappingError> {
    for &edit in edits {
        stage(session, edit)?;
    }
    Ok(())
}

/// Resolves the edit's target against the current server mapping and stages
/// it.  `Key` targets are located on the server, not in staged edits.
fn stage<P: KeyboardMapping>(
    session: &mut MappingSession<P>,
    edit: Edit,
) -> Result<KeyLocation, MappingError> {
    let keycode = match edit.target {
        Target::Key(key) => session.locate(key)?.keycode,
        Target::Keycode(keycode) => keycode,
    };
    let location = KeyLocation::at(keycode, edit.level);
    session.assign(location, edit.glyph)?;
    debug!(glyph = ?edit.glyph, %location, "edit staged");
    Ok(location)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
