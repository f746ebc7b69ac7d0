//! Configuration structures for bundling operations.
//!
//! This module provides the immutable [`ThemeContext`] handed to every
//! pipeline stage, the raw `config.json` model, per-invocation
//! [`BuildOptions`], and a builder that assembles them.

mod builder;
mod core;
mod options;
mod raw;

// Re-export all public types
pub use builder::ThemeContextBuilder;
pub use core::{DEFAULT_BUNDLE_NAME, ThemeContext};
pub use options::BuildOptions;
pub use raw::{RawThemeConfig, ThemeMeta};
