//! Throwaway themes for integration tests.

#![allow(dead_code)]

use std::{
    collections::BTreeSet,
    fs,
    io::Read,
    path::{Path, PathBuf},
};
use tempfile::TempDir;

/// A theme on disk under a temporary directory.
pub struct TestTheme {
    dir: TempDir,
}

impl TestTheme {
    /// Minimal valid theme: config, one template, no style compiler.
    pub fn new() -> Self {
        let theme = Self {
            dir: tempfile::tempdir().unwrap(),
        };
        theme.config(r#"{"name": "Cornerstone", "version": "1.0.0"}"#);
        theme.file("templates/pages/home.html", "<h1>Home</h1>");
        theme
    }

    /// Theme with partials, regions, translations and scss sources.
    pub fn full() -> Self {
        let theme = Self::new();
        theme.config(r#"{"name": "Cornerstone", "version": "1.0.0", "css_compiler": "scss"}"#);
        theme.file(
            "templates/pages/home.html",
            "{{> components/header}}\n{{{region name=\"home_below_header\"}}}\n<h1>Home</h1>",
        );
        theme.file(
            "templates/components/header.html",
            "<header>{{{region name=\"header_bottom\"}}}</header>",
        );
        theme.file("lang/en.json", r#"{"header": {"welcome": "Welcome"}}"#);
        theme.file("schema.json", r#"[{"name": "Colors", "settings": []}]"#);
        theme.file("schemaTranslations.json", r#"{"i18n.Colors": {"default": "Colors"}}"#);
        theme.file("assets/scss/theme.scss", "@import \"settings\";\nbody { color: $text; }");
        theme.file("assets/scss/_settings.scss", "$text: #333;");
        theme.file("assets/js/theme.js", "console.log('theme');");
        theme.file("assets/js/theme.js.map", "{}");
        theme.file("assets/cdn/hero.png", "not really a png");
        theme.file("README.md", "# Cornerstone");
        theme.file("node_modules/lib/index.js", "module.exports = {};");
        theme
    }

    /// Theme root.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Replaces `config.json`.
    pub fn config(&self, json: &str) {
        self.file("config.json", json);
    }

    /// Writes a file relative to the theme root, creating parent directories.
    pub fn file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    /// Default archive path for the `Cornerstone 1.0.0` config.
    pub fn default_archive(&self) -> PathBuf {
        self.dir.path().join("Cornerstone-1.0.0.zip")
    }
}

/// Entry names in an archive.
pub fn entry_names(archive: &Path) -> BTreeSet<String> {
    let zip = zip::ZipArchive::new(fs::File::open(archive).unwrap()).unwrap();
    zip.file_names().map(String::from).collect()
}

/// Content of one archive entry.
pub fn read_entry(archive: &Path, name: &str) -> String {
    let mut zip = zip::ZipArchive::new(fs::File::open(archive).unwrap()).unwrap();
    let mut content = String::new();
    zip.by_name(name)
        .unwrap()
        .read_to_string(&mut content)
        .unwrap();
    content
}
