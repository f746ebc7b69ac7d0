//! Core ThemeContext struct and implementations.

use super::{BuildOptions, RawThemeConfig};
use crate::bundler::collaborators::ThemeConfiguration;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

/// Archive stem used when neither an explicit name nor a theme name and
/// version are available.
pub const DEFAULT_BUNDLE_NAME: &str = "Theme";

/// Immutable input of one bundle invocation.
///
/// Constructed via [`ThemeContextBuilder`] and shared by reference with every
/// producer task. Nothing in the pipeline mutates it.
///
/// # Examples
///
/// ```no_run
/// use theme_bundler::bundler::{BuildOptions, ThemeContextBuilder};
///
/// # async fn example() -> theme_bundler::bundler::Result<()> {
/// let context = ThemeContextBuilder::new()
///     .theme_root("themes/cornerstone")
///     .options(BuildOptions::default())
///     .build()
///     .await?;
///
/// println!("Writing {}", context.archive_path().display());
/// # Ok(())
/// # }
/// ```
///
/// # See Also
///
/// - [`ThemeContextBuilder`] - Builder for constructing ThemeContext
/// - [`BuildOptions`] - Command-line options
///
/// [`ThemeContextBuilder`]: super::ThemeContextBuilder
#[derive(Clone)]
pub struct ThemeContext {
    /// Theme source root.
    theme_root: PathBuf,

    /// Resolved theme configuration (schema and translations).
    config: Arc<dyn ThemeConfiguration>,

    /// Build options.
    options: BuildOptions,
}

impl std::fmt::Debug for ThemeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeContext")
            .field("theme_root", &self.theme_root)
            .field("raw_config", self.config.raw())
            .field("options", &self.options)
            .finish()
    }
}

impl ThemeContext {
    /// Returns the theme source root.
    pub fn theme_root(&self) -> &Path {
        &self.theme_root
    }

    /// Returns the templates root (`<theme>/templates`).
    pub fn templates_root(&self) -> PathBuf {
        self.theme_root.join("templates")
    }

    /// Returns the resolved theme configuration.
    pub fn config(&self) -> &Arc<dyn ThemeConfiguration> {
        &self.config
    }

    /// Returns the raw `config.json` values.
    pub fn raw_config(&self) -> &RawThemeConfig {
        self.config.raw()
    }

    /// Returns the build options.
    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Returns the configured style compiler, if any.
    pub fn css_compiler(&self) -> Option<&str> {
        self.raw_config().css_compiler()
    }

    /// Returns the archive file name.
    ///
    /// `<name>.zip` when a name override is given, `<theme name>-<version>.zip`
    /// when both are configured, otherwise `Theme.zip`.
    pub fn archive_file_name(&self) -> String {
        if let Some(name) = self.options.name.as_deref().filter(|n| !n.is_empty()) {
            return format!("{name}.zip");
        }

        let raw = self.raw_config();
        match (raw.name(), raw.version()) {
            (Some(name), Some(version)) => format!("{name}-{version}.zip"),
            _ => format!("{DEFAULT_BUNDLE_NAME}.zip"),
        }
    }

    /// Returns the directory the archive is written to.
    pub fn output_directory(&self) -> &Path {
        self.options.dest.as_deref().unwrap_or(&self.theme_root)
    }

    /// Returns the full archive path (not yet absolutized).
    pub fn archive_path(&self) -> PathBuf {
        self.output_directory().join(self.archive_file_name())
    }

    /// Creates a new ThemeContext (used by ThemeContextBuilder).
    pub(super) fn new(
        theme_root: PathBuf,
        config: Arc<dyn ThemeConfiguration>,
        options: BuildOptions,
    ) -> Self {
        Self {
            theme_root,
            config,
            options,
        }
    }
}
