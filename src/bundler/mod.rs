//! Theme bundle assembly.
//!
//! Turns a storefront theme source tree (`config.json`, `templates/**/*.html`,
//! `lang/*.json`, style sources, schema files) into one zip archive holding the
//! raw sources, their parsed JSON forms and a manifest.
//!
//! # Layout
//!
//! - [`settings`] - the immutable [`ThemeContext`] and its builder
//! - [`collaborators`] - parser, validator and build-worker interfaces with
//!   default implementations
//! - [`graph`] - partial inclusion graph and cycle detection
//! - [`archive`] - raw file allowlist, generated entries, zip writer, size policy
//! - `builder` - the [`Bundler`] orchestrator and producer tasks

pub mod archive;
mod builder;
pub mod collaborators;
mod error;
pub mod graph;
pub mod settings;
pub mod utils;

pub use archive::{MAX_BUNDLE_BYTES, MAX_TEMPLATE_BYTES, SizePolicy, SizeReport, WrittenArchive};
pub use builder::{
    Bundler, Manifest, ParsedAssetSet, StyleSet, TASKS, TaskOutput, TaskSpec, build_manifest,
    calculate_sha256, run_tasks, select_tasks, template_path_hash,
};
pub use collaborators::{Collaborators, ParsedTemplate, PartialReference, TemplateSet};
pub use error::{Context, Error, ErrorExt, Result, SizeViolation};
pub use graph::{DependencyGraph, check_circular_dependencies};
pub use settings::{
    BuildOptions, DEFAULT_BUNDLE_NAME, RawThemeConfig, ThemeContext, ThemeContextBuilder, ThemeMeta,
};
