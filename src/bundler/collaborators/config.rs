//! Theme configuration providers.

use super::ThemeConfiguration;
use crate::bundler::{
    Error, Result,
    settings::RawThemeConfig,
    utils::fs::{read_json, read_json_or},
};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Raw theme configuration, at the theme root.
pub const CONFIG_FILE: &str = "config.json";
/// Theme editor schema, at the theme root.
pub const SCHEMA_FILE: &str = "schema.json";
/// Schema label translations, at the theme root.
pub const SCHEMA_TRANSLATIONS_FILE: &str = "schemaTranslations.json";

/// Theme configuration backed by files in the theme root.
///
/// `config.json` is read once at load time; the schema files are read on
/// demand by the producer tasks. A missing `schema.json` yields `[]` and a
/// missing `schemaTranslations.json` yields `{}`.
#[derive(Debug, Clone)]
pub struct FileThemeConfig {
    theme_root: PathBuf,
    raw: RawThemeConfig,
}

impl FileThemeConfig {
    /// Loads `config.json` from `theme_root`.
    pub async fn load(theme_root: &Path) -> Result<Self> {
        let config_path = theme_root.join(CONFIG_FILE);
        let value = read_json(&config_path).await?;
        let raw: RawThemeConfig = serde_json::from_value(value).map_err(|e| {
            Error::GenericError(format!("Invalid {}: {}", config_path.display(), e))
        })?;

        log::debug!(
            "Loaded theme config: name={:?} version={:?} css_compiler={:?}",
            raw.name,
            raw.version,
            raw.css_compiler
        );

        Ok(Self {
            theme_root: theme_root.to_path_buf(),
            raw,
        })
    }
}

#[async_trait]
impl ThemeConfiguration for FileThemeConfig {
    fn raw(&self) -> &RawThemeConfig {
        &self.raw
    }

    async fn schema(&self) -> Result<Value> {
        read_json_or(&self.theme_root.join(SCHEMA_FILE), Value::Array(Vec::new())).await
    }

    async fn schema_translations(&self) -> Result<Value> {
        read_json_or(
            &self.theme_root.join(SCHEMA_TRANSLATIONS_FILE),
            Value::Object(Map::new()),
        )
        .await
    }
}

/// In-memory theme configuration.
///
/// Useful when the configuration is resolved by the caller rather than read
/// from disk.
#[derive(Debug, Clone, Default)]
pub struct StaticThemeConfig {
    raw: RawThemeConfig,
    schema: Value,
    schema_translations: Value,
}

impl StaticThemeConfig {
    /// Creates a configuration with an empty schema and no translations.
    pub fn new(raw: RawThemeConfig) -> Self {
        Self {
            raw,
            schema: Value::Array(Vec::new()),
            schema_translations: Value::Object(Map::new()),
        }
    }

    /// Sets the schema document.
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = schema;
        self
    }

    /// Sets the schema translations document.
    pub fn with_schema_translations(mut self, translations: Value) -> Self {
        self.schema_translations = translations;
        self
    }
}

#[async_trait]
impl ThemeConfiguration for StaticThemeConfig {
    fn raw(&self) -> &RawThemeConfig {
        &self.raw
    }

    async fn schema(&self) -> Result<Value> {
        Ok(self.schema.clone())
    }

    async fn schema_translations(&self) -> Result<Value> {
        Ok(self.schema_translations.clone())
    }
}
