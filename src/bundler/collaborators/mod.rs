//! Collaborator interfaces consumed by the bundle pipeline.
//!
//! The pipeline never parses theme sources itself. Each asset category is
//! handled by an injected collaborator behind one of the traits below, and
//! [`Collaborators::defaults`] wires up the implementations shipped with this
//! crate:
//!
//! - [`ScssAssembler`] - style sources and their import graph
//! - [`HandlebarsTemplateAssembler`] - templates and nested partials
//! - [`JsonLangAssembler`] - `lang/*.json` translation files
//! - [`FileThemeConfig`] - `config.json`, `schema.json`, `schemaTranslations.json`
//! - [`DefaultThemeValidator`] - theme structure and partial references
//! - [`HandlebarsRegionExtractor`] - `{{{region}}}` declarations
//! - [`CommandBuildWorker`] - optional production build command

mod config;
mod lang;
mod regions;
mod style;
mod templates;
mod validator;
mod worker;

use crate::bundler::{Result, settings::RawThemeConfig, settings::ThemeContext};
use async_trait::async_trait;
use serde_json::Value;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Arc,
};

pub use config::{FileThemeConfig, StaticThemeConfig};
pub use lang::JsonLangAssembler;
pub use regions::{HandlebarsRegionExtractor, Region, RegionMap};
pub use style::{ScssAssembler, StyleOptions};
pub use templates::{HandlebarsTemplateAssembler, ParsedTemplate, PartialReference};
pub use validator::DefaultThemeValidator;
pub use worker::CommandBuildWorker;

/// Parsed templates keyed by template path (unix separators, no extension).
pub type TemplateSet = BTreeMap<String, ParsedTemplate>;

/// Turns one style source into a structured style tree.
#[async_trait]
pub trait StyleAssembler: Send + Sync {
    /// Parses `source_file`, resolving imports against `base_path`.
    async fn assemble(
        &self,
        source_file: &Path,
        base_path: &Path,
        compiler: &str,
        options: &StyleOptions,
    ) -> Result<Value>;
}

/// Turns one template into its parsed form, nested partials included.
#[async_trait]
pub trait TemplateAssembler: Send + Sync {
    /// Parses the template named `partial` under `templates_root`.
    async fn assemble(&self, templates_root: &Path, partial: &str) -> Result<ParsedTemplate>;

    /// Parses every template in `partials`.
    ///
    /// The default assembles them one at a time. Implementations may share
    /// reads and subtrees across the set.
    async fn assemble_set(
        &self,
        templates_root: &Path,
        partials: &[String],
    ) -> Result<TemplateSet> {
        let mut templates = TemplateSet::new();
        for partial in partials {
            let parsed = self.assemble(templates_root, partial).await?;
            templates.insert(partial.clone(), parsed);
        }
        Ok(templates)
    }
}

/// Produces the theme's translation document.
#[async_trait]
pub trait LangAssembler: Send + Sync {
    /// Assembles every language file into one document.
    async fn assemble(&self) -> Result<Value>;
}

/// Resolved theme configuration.
#[async_trait]
pub trait ThemeConfiguration: Send + Sync {
    /// Raw `config.json` values.
    fn raw(&self) -> &RawThemeConfig;

    /// Theme editor schema.
    async fn schema(&self) -> Result<Value>;

    /// Translations of the schema's labels.
    async fn schema_translations(&self) -> Result<Value>;
}

/// Structural checks over the theme and its parsed templates.
#[async_trait]
pub trait ThemeValidator: Send + Sync {
    /// Whole-theme check run before any producer starts.
    async fn validate_theme(&self, context: &ThemeContext) -> Result<()>;

    /// Checks that every reference in the parsed templates resolves.
    async fn check_object_references(&self, templates: &TemplateSet) -> Result<()>;
}

/// Derives the region map for the manifest.
pub trait RegionExtractor: Send + Sync {
    /// Extracts regions declared by `template_paths`, using `templates` for content.
    fn extract(&self, templates: &TemplateSet, template_paths: &[String]) -> RegionMap;
}

/// Optional production build step run alongside the parsers.
#[async_trait]
pub trait BuildWorker: Send + Sync {
    /// Runs the build against the theme.
    async fn build(&self, context: &ThemeContext) -> Result<()>;
}

/// The full set of collaborators injected into a [`Bundler`].
///
/// [`Bundler`]: crate::bundler::Bundler
#[derive(Clone)]
pub struct Collaborators {
    /// Style assembler.
    pub style: Arc<dyn StyleAssembler>,
    /// Template assembler.
    pub templates: Arc<dyn TemplateAssembler>,
    /// Language assembler.
    pub lang: Arc<dyn LangAssembler>,
    /// Theme validator.
    pub validator: Arc<dyn ThemeValidator>,
    /// Region extractor.
    pub regions: Arc<dyn RegionExtractor>,
    /// Build worker; the `theme_build` task exists only when this is set.
    pub build_worker: Option<Arc<dyn BuildWorker>>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("build_worker", &self.build_worker.as_ref().map(|_| "<BuildWorker>"))
            .finish_non_exhaustive()
    }
}

impl Collaborators {
    /// Default collaborators for a theme rooted at `theme_root`.
    pub fn defaults(theme_root: impl Into<PathBuf>) -> Self {
        let theme_root = theme_root.into();
        Self {
            style: Arc::new(ScssAssembler),
            templates: Arc::new(HandlebarsTemplateAssembler),
            lang: Arc::new(JsonLangAssembler::new(theme_root.join("lang"))),
            validator: Arc::new(DefaultThemeValidator),
            regions: Arc::new(HandlebarsRegionExtractor),
            build_worker: None,
        }
    }

    /// Injects a build worker, enabling the `theme_build` task.
    pub fn with_build_worker(mut self, worker: Arc<dyn BuildWorker>) -> Self {
        self.build_worker = Some(worker);
        self
    }
}
