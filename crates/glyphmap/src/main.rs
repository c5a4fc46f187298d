//! glyphmap command-line tool: entry point.
//!
//! Puts Unicode glyphs onto X11 keys by rewriting the server's keyboard
//! mapping.  Changes last until the layout is reloaded (for example by
//! `setxkbmap`) or the X session ends.
//!
//! # Usage
//!
//! ```text
//! glyphmap [OPTIONS] <COMMAND>
//!
//! Commands:
//!   resolve      Print the keysym a glyph resolves to
//!   locate       Show which key currently types a glyph
//!   assign       Place one glyph on a key slot
//!   apply        Apply every placement in a TOML remap plan
//!   dump         Print the current keysym lists
//!   init-config  Write a default config file
//!
//! Options:
//!   --config <PATH>    Config file [env: GLYPHMAP_CONFIG]
//!   --display <NAME>   X display, overriding the config and $DISPLAY
//!   --keysyms <PATH>   Keysym table, overriding the config
//! ```
//!
//! # Examples
//!
//! ```text
//! glyphmap assign --key a --level altgr æ
//! glyphmap assign --keycode 26 --level shift+altgr €
//! glyphmap apply nordic.toml --dry-run
//! ```
//!
//! Log output goes to stderr.  `RUST_LOG` overrides `[general] log_level`;
//! set it to see events from before the config file is read.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

use glyphmap::application::lookup::{describe_keycode, describe_row, find_glyph};
use glyphmap::application::remap::{RemapPlan, RemapUseCase, Target};
use glyphmap::infrastructure::storage::config::{
    config_file_path, load_config_from, write_default_config, AppConfig, GeneralConfig,
};
use glyphmap::infrastructure::x11::{with_default_session, X11Keyboard};
use glyphmap_core::{single_char, GlyphResolver, Keycode, ModifierLevel};
use x11rb::rust_connection::RustConnection;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Remap Unicode glyphs onto X11 keys.
#[derive(Debug, Parser)]
#[command(name = "glyphmap", version, about)]
struct Cli {
    /// Path to the config file.
    ///
    /// Defaults to `$XDG_CONFIG_HOME/glyphmap/config.toml`.
    #[arg(long, global = true, env = "GLYPHMAP_CONFIG")]
    config: Option<PathBuf>,

    /// X display to connect to, e.g. `:1`.
    #[arg(long, global = true)]
    display: Option<String>,

    /// Keysym table in `keysyms.txt` format, replacing the bundled one.
    #[arg(long, global = true)]
    keysyms: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the keysym a glyph resolves to.
    Resolve {
        /// A single character.
        glyph: String,
    },

    /// Show which key currently types a glyph.
    Locate {
        /// A single character.
        glyph: String,
    },

    /// Place one glyph on a key slot and apply it.
    Assign {
        /// Target key by number.
        #[arg(long, conflicts_with = "key", required_unless_present = "key")]
        keycode: Option<Keycode>,

        /// Target key by a glyph it currently types.
        #[arg(long)]
        key: Option<String>,

        /// Slot on the key: base, shift, altgr, shift+altgr, or an index.
        #[arg(long, default_value = "base")]
        level: ModifierLevel,

        /// The glyph to place.
        glyph: String,
    },

    /// Apply every placement in a TOML remap plan.
    Apply {
        /// Path to the plan file.
        plan: PathBuf,

        /// Print the keysym lists that would be written instead of writing.
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the current keysym lists.
    Dump {
        /// Only this keycode.
        #[arg(long)]
        keycode: Option<Keycode>,
    },

    /// Write a default config file.
    InitConfig {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let Cli {
        config,
        display,
        keysyms,
        command,
    } = Cli::parse();
    let log_filter = init_tracing();

    let config_path = match config {
        Some(path) => path,
        None => config_file_path().context("locating config file")?,
    };
    // init-config must work even when the current file does not parse.
    let command = match command {
        Command::InitConfig { force } => return init_config(&config_path, force),
        command => command,
    };

    let config = load_config(&config_path, display, keysyms)?;
    if let Some(handle) = log_filter {
        handle
            .reload(EnvFilter::new(&config.general.log_level))
            .context("applying configured log level")?;
    }

    let resolver = || config.resolver().context("loading keysym table");
    let display = config.display.name.as_deref();

    match command {
        // Handled before the config is loaded.
        Command::InitConfig { .. } => {}
        Command::Resolve { glyph } => {
            let c = single_char(&glyph)?;
            let keysym = resolver()?.resolve(c);
            println!("{c:?} U+{:04X} -> keysym {keysym:#x}", u32::from(c));
        }
        Command::Locate { glyph } => locate(display, resolver()?, &glyph)?,
        Command::Assign {
            keycode,
            key,
            level,
            glyph,
        } => {
            let target = match (keycode, key) {
                (Some(keycode), _) => Target::Keycode(keycode),
                (None, Some(key)) => Target::Key(single_char(&key)?),
                (None, None) => bail!("either --keycode or --key is required"),
            };
            let use_case = RemapUseCase::new(resolver()?);
            let location = use_case
                .assign_one(connect(display)?, target, level, &glyph)
                .context("assigning glyph")?;
            println!("{glyph} -> {location}");
        }
        Command::Apply { plan, dry_run } => {
            let plan = RemapPlan::load(&plan)?;
            let use_case = RemapUseCase::new(resolver()?);
            let keyboard = connect(display)?;
            if dry_run {
                let preview = use_case.preview_plan(keyboard, &plan)?;
                for (keycode, keysyms) in &preview {
                    for slot in describe_row(use_case.resolver(), *keycode, keysyms) {
                        println!("{slot}");
                    }
                }
            } else {
                let summary = use_case
                    .apply_plan(keyboard, &plan)
                    .context("applying remap plan")?;
                println!(
                    "applied {} placements to {} keycodes",
                    summary.edits,
                    summary.keycodes.len()
                );
            }
        }
        Command::Dump { keycode } => {
            let resolver = resolver()?;
            let keyboard = connect(display)?;
            let slots = match keycode {
                Some(keycode) => describe_keycode(&keyboard, &resolver, keycode)?,
                None => keyboard
                    .mapping_table()?
                    .iter()
                    .flat_map(|(keycode, keysyms)| describe_row(&resolver, *keycode, keysyms))
                    .collect(),
            };
            for slot in slots {
                println!("{slot}");
            }
        }
    }

    Ok(())
}

/// Installs the stderr subscriber before the config is read.
///
/// Without `RUST_LOG` the filter starts at the default level and the returned
/// handle swaps in `[general] log_level` once the config is loaded.  With
/// `RUST_LOG` set there is nothing to swap and `None` is returned.
fn init_tracing() -> Option<reload::Handle<EnvFilter, Registry>> {
    let from_env = EnvFilter::try_from_default_env().ok();
    let env_set = from_env.is_some();
    let (filter, handle) = reload::Layer::new(
        from_env.unwrap_or_else(|| EnvFilter::new(GeneralConfig::default().log_level)),
    );
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
    (!env_set).then_some(handle)
}

/// Loads the config file and applies command-line overrides.
fn load_config(
    path: &Path,
    display: Option<String>,
    keysyms: Option<PathBuf>,
) -> anyhow::Result<AppConfig> {
    let mut config = load_config_from(path)
        .with_context(|| format!("loading config from {}", path.display()))?;
    if display.is_some() {
        config.display.name = display;
    }
    if keysyms.is_some() {
        config.keysyms.table = keysyms;
    }
    Ok(config)
}

fn connect(display: Option<&str>) -> anyhow::Result<X11Keyboard> {
    X11Keyboard::<RustConnection>::connect(display).context("connecting to the X server")
}

fn locate(display: Option<&str>, resolver: GlyphResolver, glyph: &str) -> anyhow::Result<()> {
    let c = single_char(glyph)?;
    // Nothing is staged, so the closing flush sends no mapping changes.
    let (key, slots) = with_default_session(display, resolver, |session| {
        let key = session.locate(c)?;
        let slots = find_glyph(session.provider(), session.resolver(), c)?;
        Ok::<_, anyhow::Error>((key, slots))
    })
    .context("locating glyph")?;
    println!("{c:?} is typed by keycode {}", key.keycode);
    for slot in slots {
        println!("  {slot}");
    }
    Ok(())
}

fn init_config(path: &Path, force: bool) -> anyhow::Result<()> {
    write_default_config(path, force).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), "default config written");
    println!("wrote {}", path.display());
    Ok(())
}
