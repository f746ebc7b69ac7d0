//! Bundle orchestration and coordination.
//!
//! This module provides the main [`Bundler`] orchestrator that turns a theme
//! source tree into a single distributable archive.
//!
//! # Overview
//!
//! The bundler:
//! 1. Validates the theme through the injected validator
//! 2. Runs the producer tasks selected for this invocation
//! 3. Checks parsed templates for dangling and circular partials
//! 4. Builds the manifest
//! 5. Writes the archive and applies the size policy
//!
//! # Example
//!
//! ```no_run
//! use theme_bundler::bundler::{BuildOptions, Bundler, Collaborators, ThemeContextBuilder};
//!
//! # async fn example() -> theme_bundler::bundler::Result<()> {
//! let context = ThemeContextBuilder::new()
//!     .theme_root("themes/cornerstone")
//!     .options(BuildOptions {
//!         dest: Some("dist".into()),
//!         ..Default::default()
//!     })
//!     .build()
//!     .await?;
//!
//! let bundler = Bundler::new(context, Collaborators::defaults("themes/cornerstone"));
//! let archive = bundler.build_bundle().await?;
//! println!("Created: {}", archive.display());
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`checksum`] - template entry names and archive checksums
//! - [`manifest`] - the `manifest.json` document
//! - [`orchestrator`] - Main [`Bundler`] struct
//! - [`tasks`] - the producer table and its executor

mod checksum;
mod manifest;
mod orchestrator;
mod tasks;

pub use checksum::{calculate_sha256, template_path_hash};
pub use manifest::{Manifest, build_manifest};
pub use orchestrator::Bundler;
pub use tasks::{ParsedAssetSet, StyleSet, TASKS, TaskOutput, TaskSpec, run_tasks, select_tasks};
