//! Builder for constructing ThemeContext.

use super::{BuildOptions, ThemeContext};
use crate::bundler::collaborators::{FileThemeConfig, ThemeConfiguration};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

/// Builder for constructing [`ThemeContext`].
///
/// # Examples
///
/// ```no_run
/// use theme_bundler::bundler::{BuildOptions, ThemeContextBuilder};
///
/// # async fn example() -> theme_bundler::bundler::Result<()> {
/// let context = ThemeContextBuilder::new()
///     .theme_root("themes/cornerstone")
///     .options(BuildOptions {
///         dest: Some("dist".into()),
///         ..Default::default()
///     })
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct ThemeContextBuilder {
    theme_root: Option<PathBuf>,
    config: Option<Arc<dyn ThemeConfiguration>>,
    options: BuildOptions,
}

impl ThemeContextBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the theme source root.
    ///
    /// # Required
    ///
    /// This field is required for building.
    pub fn theme_root<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.theme_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets a pre-resolved theme configuration.
    ///
    /// Default: `config.json`, `schema.json` and `schemaTranslations.json`
    /// read from the theme root.
    pub fn config(mut self, config: Arc<dyn ThemeConfiguration>) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets build options.
    ///
    /// Default: [`BuildOptions::default()`]
    pub fn options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the context, loading the theme configuration if none was given.
    ///
    /// # Errors
    ///
    /// Returns an error if `theme_root` is missing or `config.json` cannot be
    /// read or parsed.
    ///
    /// A relative `theme_root` is resolved against the current directory.
    pub async fn build(self) -> crate::bundler::Result<ThemeContext> {
        use crate::bundler::error::{Context, ErrorExt};
        use path_absolutize::Absolutize;

        let theme_root = self.theme_root.context("theme_root is required")?;
        let theme_root = theme_root
            .absolutize()
            .fs_context("resolving theme root", &theme_root)?
            .into_owned();

        let config = match self.config {
            Some(config) => config,
            None => Arc::new(FileThemeConfig::load(&theme_root).await?),
        };

        Ok(ThemeContext::new(theme_root, config, self.options))
    }
}
