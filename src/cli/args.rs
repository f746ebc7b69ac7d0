//! Command line argument parsing and validation.
//!
//! This module provides CLI argument parsing using clap, with validation of
//! the values clap cannot check on its own.

use crate::bundler::BuildOptions;
use clap::Parser;
use std::path::PathBuf;

/// Storefront theme bundler
#[derive(Parser, Debug)]
#[command(
    name = "theme_bundler",
    version,
    about = "Packages a storefront theme into a distributable zip bundle",
    long_about = "Validates a theme, parses its templates, styles and translations, and writes a
single zip archive containing the raw sources, their parsed JSON forms and a manifest.

Usage:
  theme_bundler
  theme_bundler --theme-root themes/cornerstone --dest dist
  theme_bundler --name cornerstone-nightly --marketplace

Exit codes: 0 = bundle written, 1 = failure, 2 = size limit exceeded (archive left on disk)."
)]
pub struct Args {
    /// Theme source root
    #[arg(short = 't', long, value_name = "DIR", default_value = ".")]
    pub theme_root: PathBuf,

    /// Archive name, without the .zip extension
    ///
    /// Defaults to `<name>-<version>` from config.json, or `Theme`.
    #[arg(short, long, value_name = "NAME")]
    pub name: Option<String>,

    /// Directory the archive is written to (created if missing)
    ///
    /// Defaults to the theme root.
    #[arg(short, long, value_name = "DIR", env = "THEME_BUNDLE_DEST")]
    pub dest: Option<PathBuf>,

    /// Apply marketplace validation rules (semver version, meta/ and composed image)
    #[arg(long)]
    pub marketplace: bool,

    /// Shell command producing the production build, run alongside the parsers
    #[arg(long, value_name = "COMMAND", env = "THEME_BUILD_COMMAND")]
    pub build_command: Option<String>,

    /// Maximum number of style sources parsed at once
    #[arg(long, value_name = "N")]
    pub style_concurrency: Option<usize>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err("Bundle name cannot be empty".to_string());
            }
            if name.contains(['/', '\\']) {
                return Err(format!(
                    "Bundle name must not contain path separators: {}",
                    name
                ));
            }
        }

        if self.style_concurrency == Some(0) {
            return Err("Style concurrency must be at least 1".to_string());
        }

        Ok(())
    }

    /// Build options for this invocation.
    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            name: self.name.clone(),
            dest: self.dest.clone(),
            marketplace: self.marketplace,
            style_concurrency: self.style_concurrency,
        }
    }

    /// Default `RUST_LOG` filter for the chosen verbosity.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}
