//! File system utilities for bundling.
//!
//! Provides theme-relative path handling, JSON loading and template
//! enumeration with path-carrying error handling.

use crate::bundler::error::{Error, ErrorExt, Result};
use serde_json::Value;
use std::{
    io,
    path::{Component, Path},
};
use tokio::fs;

/// Extension of template sources.
pub const TEMPLATE_EXTENSION: &str = "html";

/// Returns `path` relative to `root` with unix separators.
///
/// Returns `None` if `path` is not under `root`.
pub fn relative_unix_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    Some(parts.join("/"))
}

/// Reads and parses a JSON file.
pub async fn read_json(path: &Path) -> Result<Value> {
    let content = fs::read(path).await.fs_context("reading JSON file", path)?;
    serde_json::from_slice(&content).map_err(|e| {
        Error::GenericError(format!("Invalid JSON in {}: {}", path.display(), e))
    })
}

/// Reads and parses a JSON file, returning `default` if it does not exist.
pub async fn read_json_or(path: &Path, default: Value) -> Result<Value> {
    match fs::read(path).await {
        Ok(content) => serde_json::from_slice(&content).map_err(|e| {
            Error::GenericError(format!("Invalid JSON in {}: {}", path.display(), e))
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(default),
        Err(e) => Err(Error::Fs {
            context: "reading JSON file",
            path: path.to_path_buf(),
            error: e,
        }),
    }
}

/// Lists every template under `templates_root`.
///
/// Returns template paths relative to the root, with unix separators and the
/// `.html` extension stripped, sorted lexically.
pub async fn list_template_files(templates_root: &Path) -> Result<Vec<String>> {
    let root = templates_root.to_path_buf();

    // Offload blocking traversal to dedicated thread pool
    tokio::task::spawn_blocking(move || {
        let mut templates = Vec::new();

        for entry in walkdir::WalkDir::new(&root).follow_links(true) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(TEMPLATE_EXTENSION) {
                continue;
            }

            if let Some(relative) = relative_unix_path(&root, &path.with_extension("")) {
                templates.push(relative);
            }
        }

        templates.sort();
        Ok::<Vec<String>, Error>(templates)
    })
    .await
    .map_err(|e| Error::GenericError(format!("Template enumeration task panicked: {}", e)))?
}

/// Creates all of the directories of the specified path.
pub async fn create_dir_all(path: &Path) -> Result<()> {
    // create_dir_all is already idempotent - succeeds even if dir exists
    fs::create_dir_all(path)
        .await
        .fs_context("creating directory", path)
}

/// Returns true if `path` exists and is a regular file.
pub async fn is_file(path: &Path) -> bool {
    fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false)
}

/// Returns true if `path` exists and is a directory.
pub async fn is_dir(path: &Path) -> bool {
    fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn relative_paths_use_unix_separators() {
        let root = PathBuf::from("theme").join("templates");
        let path = root.join("pages").join("account").join("orders");
        assert_eq!(
            relative_unix_path(&root, &path).as_deref(),
            Some("pages/account/orders")
        );
        assert_eq!(relative_unix_path(&root, Path::new("elsewhere")), None);
    }

    #[tokio::test]
    async fn lists_only_html_templates() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("pages/account")).unwrap();
        std::fs::create_dir_all(root.join("components")).unwrap();
        std::fs::write(root.join("pages/home.html"), "home").unwrap();
        std::fs::write(root.join("pages/account/orders.html"), "orders").unwrap();
        std::fs::write(root.join("components/card.html"), "card").unwrap();
        std::fs::write(root.join("components/README.md"), "docs").unwrap();

        let templates = list_template_files(root).await.unwrap();
        assert_eq!(
            templates,
            vec!["components/card", "pages/account/orders", "pages/home"]
        );
    }

    #[tokio::test]
    async fn missing_templates_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_template_files(&dir.path().join("templates")).await.is_err());
    }

    #[tokio::test]
    async fn read_json_or_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let value = read_json_or(&dir.path().join("schema.json"), Value::Array(vec![]))
            .await
            .unwrap();
        assert_eq!(value, Value::Array(vec![]));
    }
}
