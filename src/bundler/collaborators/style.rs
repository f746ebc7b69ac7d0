//! Style source assembly.
//!
//! The default assembler does not compile styles. It resolves the import graph
//! of a source file and records it so the consuming runtime can compile on
//! demand:
//!
//! ```json
//! {
//!   "file": "theme.scss",
//!   "files": {
//!     "theme.scss": { "imports": ["_settings.scss"], "source": "..." },
//!     "_settings.scss": { "imports": [], "source": "..." }
//!   }
//! }
//! ```
//!
//! Every reachable file appears once in `files`, keyed by its path relative to
//! the base path. The tree below `file` is recovered by following `imports`,
//! so import depth never nests the document.

use super::StyleAssembler;
use crate::{
    bail,
    bundler::{Result, error::ErrorExt},
};
use async_trait::async_trait;
use path_absolutize::Absolutize;
use regex::Regex;
use serde_json::{Map, Value, json};
use std::{
    collections::{BTreeMap, VecDeque},
    path::{Path, PathBuf},
    sync::LazyLock,
};

/// `@import`, `@use` and `@forward` statements.
static IMPORT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@(?:import|use|forward)\s+([^;]+);"#).expect("import pattern is a valid regex")
});

/// Options passed to the style assembler.
#[derive(Debug, Clone)]
pub struct StyleOptions {
    /// Embed each file's source text in the tree.
    pub include_source: bool,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            include_source: true,
        }
    }
}

/// Extracts import targets from style source.
///
/// Plain CSS imports (`url(...)`, remote URLs, `.css` files) are skipped.
pub fn import_targets(source: &str) -> Vec<String> {
    IMPORT_PATTERN
        .captures_iter(source)
        .filter_map(|c| c.get(1))
        .flat_map(|m| m.as_str().split(','))
        .filter_map(|target| {
            let target = target.split_whitespace().next()?;
            let target = target.trim_matches(|c| c == '"' || c == '\'');
            let remote = target.starts_with("url(")
                || target.starts_with("http://")
                || target.starts_with("https://")
                || target.starts_with("//");
            let builtin = target.starts_with("sass:");
            if target.is_empty() || remote || builtin || target.ends_with(".css") {
                None
            } else {
                Some(target.to_string())
            }
        })
        .collect()
}

/// Candidate files for an import target, in lookup order.
fn candidates(dir: &Path, target: &str, extension: &str) -> Vec<PathBuf> {
    let path = dir.join(target);
    let parent = path.parent().unwrap_or(dir).to_path_buf();
    let stem = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if stem.ends_with(&format!(".{extension}")) {
        return vec![path.clone(), parent.join(format!("_{stem}"))];
    }

    vec![
        parent.join(format!("{stem}.{extension}")),
        parent.join(format!("_{stem}.{extension}")),
        path.join(format!("_index.{extension}")),
        path.join(format!("index.{extension}")),
    ]
}

/// Loaded style file.
struct LoadedStyle {
    source: String,
    /// Resolved import files, in source order.
    imports: Vec<PathBuf>,
}

/// SCSS import-graph assembler.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScssAssembler;

impl ScssAssembler {
    async fn resolve(
        importer: &Path,
        base_path: &Path,
        target: &str,
        extension: &str,
    ) -> Result<PathBuf> {
        let importer_dir = importer.parent().unwrap_or(base_path);
        let mut dirs = vec![importer_dir];
        if importer_dir != base_path {
            dirs.push(base_path);
        }

        for dir in dirs {
            for candidate in candidates(dir, target, extension) {
                if tokio::fs::metadata(&candidate)
                    .await
                    .map(|m| m.is_file())
                    .unwrap_or(false)
                {
                    // Collapse `..` so each file is loaded once
                    let normalized = candidate
                        .absolutize()
                        .fs_context("normalizing import path", &candidate)?
                        .into_owned();
                    return Ok(normalized);
                }
            }
        }

        bail!(
            "Cannot resolve import '{}' from {}",
            target,
            importer.display()
        )
    }

    async fn load_all(
        source_file: &Path,
        base_path: &Path,
        extension: &str,
    ) -> Result<BTreeMap<PathBuf, LoadedStyle>> {
        let mut loaded = BTreeMap::new();
        let mut queue = VecDeque::from([source_file.to_path_buf()]);

        while let Some(file) = queue.pop_front() {
            if loaded.contains_key(&file) {
                continue;
            }

            let source = tokio::fs::read_to_string(&file)
                .await
                .fs_context("reading style source", &file)?;

            let mut imports = Vec::new();
            for target in import_targets(&source) {
                let resolved = Self::resolve(&file, base_path, &target, extension).await?;
                if !loaded.contains_key(&resolved) {
                    queue.push_back(resolved.clone());
                }
                imports.push(resolved);
            }

            loaded.insert(file, LoadedStyle { source, imports });
        }

        Ok(loaded)
    }

    /// Import graph of `source_file` as a flat file table.
    fn document(
        source_file: &Path,
        base_path: &Path,
        loaded: &BTreeMap<PathBuf, LoadedStyle>,
        options: &StyleOptions,
    ) -> Value {
        let relative = |file: &Path| {
            file.strip_prefix(base_path)
                .unwrap_or(file)
                .to_string_lossy()
                .replace('\\', "/")
        };

        let mut files = Map::new();
        for (file, style) in loaded {
            let mut entry = Map::new();
            let imports = style.imports.iter().map(|i| json!(relative(i))).collect();
            entry.insert("imports".into(), Value::Array(imports));
            if options.include_source {
                entry.insert("source".into(), json!(style.source));
            }
            files.insert(relative(file), Value::Object(entry));
        }

        json!({ "file": relative(source_file), "files": files })
    }
}

#[async_trait]
impl StyleAssembler for ScssAssembler {
    async fn assemble(
        &self,
        source_file: &Path,
        base_path: &Path,
        compiler: &str,
        options: &StyleOptions,
    ) -> Result<Value> {
        log::debug!("Assembling {} source {}", compiler, source_file.display());

        let source_file = source_file
            .absolutize()
            .fs_context("resolving style source", source_file)?;
        let base_path = base_path
            .absolutize()
            .fs_context("resolving style base path", base_path)?;
        let (source_file, base_path) = (source_file.as_ref(), base_path.as_ref());

        let loaded = Self::load_all(source_file, base_path, compiler).await?;
        log::debug!("Resolved {} style file(s)", loaded.len());
        Ok(Self::document(source_file, base_path, &loaded, options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_plain_css_imports() {
        let targets = import_targets(
            r#"@import "settings", 'tools/mixins';
               @import url("https://fonts.example.com/a.css");
               @use "sass:math";
               @import "vendor/reset.css";
               @use 'components/card' as card;"#,
        );
        assert_eq!(targets, vec!["settings", "tools/mixins", "components/card"]);
    }

    #[tokio::test]
    async fn records_import_graph_with_partials() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path();
        std::fs::create_dir_all(base.join("tools")).unwrap();
        std::fs::write(base.join("theme.scss"), r#"@import "settings"; @import "tools/mixins";"#)
            .unwrap();
        std::fs::write(base.join("_settings.scss"), "$red: #f00;").unwrap();
        std::fs::write(base.join("tools/_mixins.scss"), r#"@import "../settings";"#).unwrap();

        let tree = ScssAssembler
            .assemble(&base.join("theme.scss"), base, "scss", &StyleOptions::default())
            .await
            .unwrap();

        assert_eq!(tree["file"], "theme.scss");
        let files = tree["files"].as_object().unwrap();
        assert_eq!(files.len(), 3);
        assert_eq!(
            files["theme.scss"]["imports"],
            json!(["_settings.scss", "tools/_mixins.scss"])
        );
        assert_eq!(files["_settings.scss"]["source"], "$red: #f00;");
        assert_eq!(files["tools/_mixins.scss"]["imports"], json!(["_settings.scss"]));
    }

    #[tokio::test]
    async fn deep_import_chain_stays_flat() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path();
        std::fs::write(base.join("theme.scss"), r#"@import "s0000";"#).unwrap();
        for i in 0..3_000 {
            let source = if i + 1 < 3_000 {
                format!(r#"@import "s{:04}";"#, i + 1)
            } else {
                "$end: 1;".to_string()
            };
            std::fs::write(base.join(format!("_s{i:04}.scss")), source).unwrap();
        }

        let tree = ScssAssembler
            .assemble(
                &base.join("theme.scss"),
                base,
                "scss",
                &StyleOptions {
                    include_source: false,
                },
            )
            .await
            .unwrap();

        let files = tree["files"].as_object().unwrap();
        assert_eq!(files.len(), 3_001);
        assert_eq!(files["_s1234.scss"]["imports"], json!(["_s1235.scss"]));
        assert!(files["_s2999.scss"].get("source").is_none());
        assert!(serde_json::to_vec(&tree).is_ok());
    }

    #[tokio::test]
    async fn unresolved_import_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("theme.scss"), r#"@import "missing";"#).unwrap();

        let result = ScssAssembler
            .assemble(
                &dir.path().join("theme.scss"),
                dir.path(),
                "scss",
                &StyleOptions::default(),
            )
            .await;
        assert!(result.is_err());
    }
}
