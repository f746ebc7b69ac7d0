//! Main bundle orchestration.
//!
//! This module provides the [`Bundler`] orchestrator that validates a theme,
//! runs the producer tasks, builds the manifest and writes the archive.

use crate::bundler::{
    Error, Result,
    archive::{
        ArchiveEntry, GeneratedEntries, RAW_PATTERNS, SizePolicy, collect_raw_entries,
        template_sizes, write_archive,
    },
    collaborators::{Collaborators, TemplateSet},
    error::ErrorExt,
    settings::ThemeContext,
    utils::fs::create_dir_all,
};
use path_absolutize::Absolutize;
use std::{path::PathBuf, sync::Arc};

use super::{
    manifest::build_manifest,
    tasks::{TaskSpec, run_tasks, select_tasks},
};

/// Main bundle orchestrator.
///
/// Owns one invocation: the immutable [`ThemeContext`], the injected
/// [`Collaborators`] and the producer tasks selected for them. The task set is
/// fixed at construction.
///
/// # Pipeline
///
/// 1. Whole-theme validation; nothing else starts if it fails
/// 2. Producer tasks, all at once; the first failure wins
/// 3. Manifest from the on-disk template list and parsed templates
/// 4. Archive written by a single blocking task, then closed
/// 5. Size policy checked against the closed archive
///
/// # Examples
///
/// ```no_run
/// use theme_bundler::bundler::{Bundler, Collaborators, ThemeContextBuilder};
///
/// # async fn example() -> theme_bundler::bundler::Result<()> {
/// let context = ThemeContextBuilder::new()
///     .theme_root("themes/cornerstone")
///     .build()
///     .await?;
/// let collaborators = Collaborators::defaults("themes/cornerstone");
///
/// let bundler = Bundler::new(context, collaborators);
/// let archive = bundler.build_bundle().await?;
/// println!("Created: {}", archive.display());
/// # Ok(())
/// # }
/// ```
pub struct Bundler {
    context: Arc<ThemeContext>,
    collaborators: Arc<Collaborators>,
    tasks: Vec<&'static TaskSpec>,
    size_policy: SizePolicy,
}

impl std::fmt::Debug for Bundler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bundler")
            .field("context", &self.context)
            .field("tasks", &self.task_names())
            .field("size_policy", &self.size_policy)
            .finish()
    }
}

impl Bundler {
    /// Creates a bundler, selecting producer tasks from the context and
    /// collaborators.
    ///
    /// # Arguments
    ///
    /// * `context` - Theme root, configuration and build options
    /// * `collaborators` - Parsers, validator and optional build worker
    pub fn new(context: ThemeContext, collaborators: Collaborators) -> Self {
        let tasks = select_tasks(&context, &collaborators);
        Self {
            context: Arc::new(context),
            collaborators: Arc::new(collaborators),
            tasks,
            size_policy: SizePolicy::default(),
        }
    }

    /// Replaces the default size limits.
    pub fn with_size_policy(mut self, size_policy: SizePolicy) -> Self {
        self.size_policy = size_policy;
        self
    }

    /// Names of the producer tasks taking part, in table order.
    pub fn task_names(&self) -> Vec<&'static str> {
        self.tasks.iter().map(|t| t.name).collect()
    }

    /// Returns the invocation context.
    pub fn context(&self) -> &ThemeContext {
        &self.context
    }

    /// Builds the bundle and returns the absolute archive path.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] before any producer runs
    /// - [`Error::Task`] for the first producer failure; no archive is written
    /// - [`Error::SizeLimit`] when the written archive breaks a size limit; the
    ///   archive is left on disk
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use theme_bundler::bundler::{Bundler, Error};
    ///
    /// # async fn example(bundler: Bundler) {
    /// match bundler.build_bundle().await {
    ///     Ok(path) => println!("Created: {}", path.display()),
    ///     Err(Error::SizeLimit { archive, violation }) => {
    ///         eprintln!("{} is too large: {}", archive.display(), violation)
    ///     }
    ///     Err(e) => eprintln!("Bundle failed: {}", e),
    /// }
    /// # }
    /// ```
    pub async fn build_bundle(&self) -> Result<PathBuf> {
        log::info!("Validating theme at {}", self.context.theme_root().display());
        self.collaborators
            .validator
            .validate_theme(&self.context)
            .await?;

        log::info!(
            "Running {} task(s): {}",
            self.tasks.len(),
            self.task_names().join(", ")
        );
        let assets = run_tasks(
            &self.tasks,
            self.context.clone(),
            self.collaborators.clone(),
        )
        .await?;

        let empty = TemplateSet::new();
        let templates = assets.templates.as_ref().unwrap_or(&empty);
        let manifest = build_manifest(
            &self.context.templates_root(),
            templates,
            self.collaborators.regions.as_ref(),
        )
        .await?;

        let archive_path = self.resolve_archive_path()?;
        if let Some(parent) = archive_path.parent() {
            create_dir_all(parent).await?;
        }

        let mut entries = self.raw_entries().await?;
        let GeneratedEntries {
            entries: generated,
            templates: template_entries,
        } = GeneratedEntries::from_assets(&assets, &manifest)?;
        entries.extend(generated);

        let written = write_archive(&archive_path, entries).await?;
        log::info!(
            "Wrote {} ({} bytes)",
            archive_path.display(),
            written.total_bytes
        );

        let report = self.size_policy.evaluate(
            template_sizes(&template_entries, &written),
            written.total_bytes,
        );
        if let Some(violation) = self.size_policy.check(&report) {
            log::warn!("Size limit exceeded: {}", violation);
            return Err(Error::SizeLimit {
                archive: archive_path,
                violation,
            });
        }

        log::info!("✓ Bundle ready: {}", archive_path.display());
        Ok(archive_path)
    }

    fn resolve_archive_path(&self) -> Result<PathBuf> {
        let path = self.context.archive_path();
        let absolute = path
            .absolutize()
            .fs_context("resolving archive path", &path)?;
        Ok(absolute.into_owned())
    }

    async fn raw_entries(&self) -> Result<Vec<ArchiveEntry>> {
        let theme_root = self.context.theme_root().to_path_buf();
        // Globbing walks the tree synchronously
        tokio::task::spawn_blocking(move || collect_raw_entries(&theme_root, RAW_PATTERNS))
            .await
            .map_err(|e| Error::GenericError(format!("Raw file collection panicked: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{RawThemeConfig, ThemeContextBuilder, collaborators::StaticThemeConfig};

    async fn bundler(root: &std::path::Path, css_compiler: Option<&str>) -> Bundler {
        let raw = RawThemeConfig {
            name: Some("Cornerstone".into()),
            version: Some("6.1.0".into()),
            css_compiler: css_compiler.map(String::from),
            ..Default::default()
        };
        let context = ThemeContextBuilder::new()
            .theme_root(root)
            .config(Arc::new(StaticThemeConfig::new(raw)))
            .build()
            .await
            .unwrap();
        Bundler::new(context, Collaborators::defaults(root))
    }

    #[tokio::test]
    async fn task_set_is_fixed_at_construction() {
        let dir = tempfile::tempdir().unwrap();
        let with_css = bundler(dir.path(), Some("scss")).await;
        assert_eq!(
            with_css.task_names(),
            vec!["css", "templates", "lang", "schema", "schema_translations"]
        );

        let without_css = bundler(dir.path(), None).await;
        assert!(!without_css.task_names().contains(&"css"));
    }

    #[tokio::test]
    async fn validation_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let bundler = bundler(dir.path(), None).await;

        let err = bundler.build_bundle().await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "{err:?}");
        assert!(!dir.path().join("Cornerstone-6.1.0.zip").exists());
    }

    #[tokio::test]
    async fn relative_archive_path_is_absolutized() {
        let dir = tempfile::tempdir().unwrap();
        let bundler = bundler(dir.path(), None).await;
        let path = bundler.resolve_archive_path().unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("Cornerstone-6.1.0.zip"));
    }
}
