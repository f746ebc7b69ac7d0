//! Per-invocation build options.

use std::path::PathBuf;

/// Options controlling one bundle invocation.
///
/// These come from the command line; nothing here is read from the theme.
///
/// # Examples
///
/// ```no_run
/// use theme_bundler::bundler::BuildOptions;
///
/// let options = BuildOptions {
///     name: Some("cornerstone-nightly".into()),
///     dest: Some("dist".into()),
///     marketplace: true,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Archive name override, without the `.zip` extension.
    ///
    /// Default: None (derived from theme name and version)
    pub name: Option<String>,

    /// Directory the archive is written to.
    ///
    /// Default: None (the theme root)
    pub dest: Option<PathBuf>,

    /// Apply the stricter marketplace validation rules.
    pub marketplace: bool,

    /// Upper bound on style sources parsed at once.
    ///
    /// Default: None (every source file is parsed concurrently)
    pub style_concurrency: Option<usize>,
}
