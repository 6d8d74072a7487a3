//! nrtk: Newsroom Toolkit content mirror.
//!
//! # Usage
//!
//! ```text
//! NRTK_API_URL=... NRTK_API_TOKEN=... nrtk [-l LOGLEVEL] [-i SECONDS] [--base-dir DIR]
//! ```
//!
//! Without `-i` (or with an interval under 60 seconds) a single sync cycle
//! runs and the process exits; otherwise cycles repeat forever.

mod config;
mod logging;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use nrtk_renderer::Renderer;
use nrtk_sync::{pipeline, HttpSource, Layout, Schedule};

use config::Settings;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug, Default)]
#[command(
    name = "nrtk",
    version,
    about = "Mirror Newsroom Toolkit content into a local www/ directory",
    long_about = None,
)]
pub struct Cli {
    /// Log level (DEBUG, INFO, WARNING, ERROR, CRITICAL). `LOGLEVEL` takes precedence.
    #[arg(short, long)]
    pub loglevel: Option<String>,

    /// Repeat sync every N seconds (minimum 60). `INFINITY` takes precedence.
    #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
    pub infinity: i64,

    /// Directory holding `.nrtk/` and `www/` [env: NRTK_BASE_DIR, default: cwd].
    #[arg(long)]
    pub base_dir: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::resolve(&cli, |key| std::env::var(key).ok())?;

    let layout = Layout::new(&settings.base_dir);
    layout
        .ensure_dirs()
        .with_context(|| format!("unable to prepare {}", layout.base().display()))?;

    let sink = logging::init_tracing(settings.level, &layout.log_path());
    tracing::debug!(?sink, base = %layout.base().display(), "logging initialised");

    let source = HttpSource::new(&settings.api_url, &settings.api_token);
    let renderer = Renderer::new().context("failed to load embedded templates")?;
    let schedule = Schedule::from_secs(settings.interval_secs);

    if !pipeline::run(&layout, &source, &renderer, schedule) {
        bail!("sync cycle failed, see log for details");
    }
    Ok(())
}
