//! Storefront theme bundler library
//!
//! This library turns a theme source tree into a single zip bundle:
//! - Raw theme sources selected by a fixed allowlist
//! - Parsed templates, styles and translations as JSON
//! - A manifest of templates and their declared regions
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod bundler;
pub mod cli;
pub mod error;

// Re-export commonly used types
pub use error::{BundlerError, CliError, Result};
