//! Language file assembly.

use super::LangAssembler;
use crate::bundler::{Error, Result, error::ErrorExt, utils::fs::read_json};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Merges `lang/*.json` into one document keyed by locale.
///
/// `lang/en.json` and `lang/fr-CA.json` become `{ "en": {..}, "fr-CA": {..} }`.
/// A missing `lang/` directory yields an empty document.
#[derive(Debug, Clone)]
pub struct JsonLangAssembler {
    lang_dir: PathBuf,
}

impl JsonLangAssembler {
    /// Creates an assembler reading from `lang_dir`.
    pub fn new(lang_dir: impl Into<PathBuf>) -> Self {
        Self {
            lang_dir: lang_dir.into(),
        }
    }
}

#[async_trait]
impl LangAssembler for JsonLangAssembler {
    async fn assemble(&self) -> Result<Value> {
        let mut entries = match tokio::fs::read_dir(&self.lang_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No language directory at {}", self.lang_dir.display());
                return Ok(Value::Object(Map::new()));
            }
            Err(e) => return Err(e).fs_context("reading language directory", &self.lang_dir),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .fs_context("reading language directory", &self.lang_dir)?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                files.push(path);
            }
        }
        files.sort();

        let mut document = Map::new();
        for path in files {
            let locale = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| {
                    Error::GenericError(format!("Invalid language file name: {}", path.display()))
                })?
                .to_string();

            let translations = read_json(&path).await?;
            document.insert(locale, translations);
        }

        log::debug!("Assembled {} locale(s)", document.len());
        Ok(Value::Object(document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn merges_locales() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("en.json"), r#"{"header":{"title":"Hi"}}"#).unwrap();
        std::fs::write(dir.path().join("fr.json"), r#"{"header":{"title":"Salut"}}"#).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let lang = JsonLangAssembler::new(dir.path()).assemble().await.unwrap();
        assert_eq!(
            lang,
            json!({"en": {"header": {"title": "Hi"}}, "fr": {"header": {"title": "Salut"}}})
        );
    }

    #[tokio::test]
    async fn missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let lang = JsonLangAssembler::new(dir.path().join("lang"))
            .assemble()
            .await
            .unwrap();
        assert_eq!(lang, json!({}));
    }

    #[tokio::test]
    async fn invalid_json_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("en.json"), "{").unwrap();
        assert!(JsonLangAssembler::new(dir.path()).assemble().await.is_err());
    }
}
