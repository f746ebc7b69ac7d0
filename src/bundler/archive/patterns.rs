//! Raw source files copied into every bundle.

use super::{ArchiveEntry, EntrySource};
use crate::bundler::{Error, Result, utils::fs::relative_unix_path};
use std::{collections::HashSet, path::Path};

/// One inclusion pattern with its own exclusions.
///
/// Patterns are relative to the theme root and use unix separators.
#[derive(Debug, Clone, Copy)]
pub struct RawPattern {
    /// Files to include.
    pub include: &'static str,
    /// Files matched by `include` to leave out.
    pub exclude: &'static [&'static str],
}

impl RawPattern {
    const fn new(include: &'static str) -> Self {
        Self {
            include,
            exclude: &[],
        }
    }
}

/// The raw file allowlist, in archive order.
pub const RAW_PATTERNS: &[RawPattern] = &[
    RawPattern {
        include: "assets/**/*",
        exclude: &["assets/cdn/**", "assets/**/*.js.map"],
    },
    RawPattern::new("CHANGELOG.md"),
    RawPattern::new("config.json"),
    RawPattern::new(".eslintrc"),
    RawPattern::new(".eslintignore"),
    RawPattern::new(".stylelintrc"),
    RawPattern::new("lang/*"),
    RawPattern::new("meta/**/*"),
    RawPattern::new("package.json"),
    RawPattern::new("README.md"),
    RawPattern::new("templates/**/*"),
    RawPattern::new("webpack.*.js"),
    RawPattern::new("stencil.conf.js"),
];

/// Collects raw entries for `patterns` under `theme_root`.
///
/// Only regular files are returned. Within a pattern files are sorted by
/// name; a file matched by more than one pattern is kept at its first match.
pub fn collect_raw_entries(
    theme_root: &Path,
    patterns: &[RawPattern],
) -> Result<Vec<ArchiveEntry>> {
    let root = glob::Pattern::escape(&theme_root.to_string_lossy());
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for pattern in patterns {
        let excludes = pattern
            .exclude
            .iter()
            .map(|e| glob::Pattern::new(e))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut matched = Vec::new();
        for path in glob::glob(&format!("{}/{}", root, pattern.include))? {
            let path = path.map_err(|e| {
                Error::GenericError(format!("Cannot read {}: {}", e.path().display(), e.error()))
            })?;
            if !path.is_file() {
                continue;
            }

            let Some(name) = relative_unix_path(theme_root, &path) else {
                continue;
            };
            if excludes.iter().any(|ex| ex.matches(&name)) {
                log::debug!("Excluding {} ({})", name, pattern.include);
                continue;
            }

            matched.push((name, path));
        }

        matched.sort();
        for (name, path) in matched {
            if seen.insert(name.clone()) {
                entries.push(ArchiveEntry {
                    name,
                    source: EntrySource::File(path),
                });
            }
        }
    }

    Ok(entries)
}
