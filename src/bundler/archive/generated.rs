//! JSON documents generated from producer results.

use super::{ArchiveEntry, EntrySource, WrittenArchive};
use crate::bundler::{
    Result,
    builder::{Manifest, ParsedAssetSet},
    builder::template_path_hash,
};
use serde::Serialize;

/// Parsed style trees, one `<stem>.json` per source.
pub const PARSED_SCSS_DIR: &str = "parsed/scss";
/// Parsed templates, one `<path hash>.json` per template.
pub const PARSED_TEMPLATES_DIR: &str = "parsed/templates";
/// Translation document.
pub const PARSED_LANG: &str = "parsed/lang.json";
/// Theme editor schema.
pub const SCHEMA: &str = "schema.json";
/// Schema translations.
pub const SCHEMA_TRANSLATIONS: &str = "schemaTranslations.json";
/// Bundle manifest.
pub const MANIFEST: &str = "manifest.json";

/// Generated entries plus the entry name of each template document.
#[derive(Debug, Default)]
pub struct GeneratedEntries {
    /// Entries in archive order.
    pub entries: Vec<ArchiveEntry>,
    /// `(template path, entry name)` for every parsed template.
    pub templates: Vec<(String, String)>,
}

/// `(template path, document bytes)` for every template entry in `written`.
pub fn template_sizes<'a>(
    templates: &'a [(String, String)],
    written: &'a WrittenArchive,
) -> impl Iterator<Item = (&'a str, u64)> + 'a {
    templates.iter().map(|(path, entry)| {
        let len = written.entry_sizes.get(entry).copied().unwrap_or_default();
        (path.as_str(), len)
    })
}

impl GeneratedEntries {
    fn push_json<T: Serialize + ?Sized>(&mut self, name: String, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.entries.push(ArchiveEntry {
            name,
            source: EntrySource::Bytes(bytes),
        });
        Ok(())
    }

    /// Serializes every producer result and the manifest.
    ///
    /// Results of tasks that did not run contribute nothing.
    pub fn from_assets(assets: &ParsedAssetSet, manifest: &Manifest) -> Result<Self> {
        let mut generated = Self::default();

        if let Some(css) = &assets.css {
            for (stem, tree) in css {
                generated.push_json(format!("{PARSED_SCSS_DIR}/{stem}.json"), tree)?;
            }
        }

        if let Some(templates) = &assets.templates {
            // Shallow clones; serialized while the archive is written
            for (path, template) in templates {
                let name = format!("{PARSED_TEMPLATES_DIR}/{}.json", template_path_hash(path));
                generated.entries.push(ArchiveEntry {
                    name: name.clone(),
                    source: EntrySource::Template(template.clone()),
                });
                generated.templates.push((path.clone(), name));
            }
        }

        if let Some(lang) = &assets.lang {
            generated.push_json(PARSED_LANG.to_string(), lang)?;
        }
        if let Some(schema) = &assets.schema {
            generated.push_json(SCHEMA.to_string(), schema)?;
        }
        if let Some(translations) = &assets.schema_translations {
            generated.push_json(SCHEMA_TRANSLATIONS.to_string(), translations)?;
        }

        generated.push_json(MANIFEST.to_string(), manifest)?;

        Ok(generated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{ParsedTemplate, collaborators::RegionMap};
    use serde_json::json;

    fn manifest() -> Manifest {
        Manifest {
            regions: RegionMap::new(),
            templates: vec!["pages/home".into()],
        }
    }

    fn names(generated: &GeneratedEntries) -> Vec<&str> {
        generated.entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn places_documents_at_reserved_paths() {
        let mut assets = ParsedAssetSet::default();
        assets.css = Some([("theme".to_string(), json!({"file": "theme.scss"}))].into());
        assets.templates = Some(
            [(
                "pages/home".to_string(),
                ParsedTemplate::new("pages/home", "<h1>Home</h1>"),
            )]
            .into(),
        );
        assets.lang = Some(json!({"en": {}}));
        assets.schema = Some(json!([]));
        assets.schema_translations = Some(json!({}));

        let generated = GeneratedEntries::from_assets(&assets, &manifest()).unwrap();
        let hash = template_path_hash("pages/home");
        assert_eq!(
            names(&generated),
            vec![
                "parsed/scss/theme.json".to_string(),
                format!("parsed/templates/{hash}.json"),
                "parsed/lang.json".to_string(),
                "schema.json".to_string(),
                "schemaTranslations.json".to_string(),
                "manifest.json".to_string(),
            ]
        );

        let entry = format!("parsed/templates/{hash}.json");
        assert_eq!(
            generated.templates,
            vec![("pages/home".to_string(), entry.clone())]
        );

        let written = WrittenArchive {
            total_bytes: 0,
            entry_sizes: [(entry, 42)].into(),
        };
        let sizes: Vec<(&str, u64)> = template_sizes(&generated.templates, &written).collect();
        assert_eq!(sizes, vec![("pages/home", 42)]);
    }

    #[test]
    fn skipped_tasks_contribute_nothing() {
        let generated =
            GeneratedEntries::from_assets(&ParsedAssetSet::default(), &manifest()).unwrap();
        assert_eq!(names(&generated), vec!["manifest.json"]);
        assert!(generated.templates.is_empty());
    }
}
