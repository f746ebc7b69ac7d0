//! Region extraction for the manifest.

use super::{RegionExtractor, TemplateSet};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::LazyLock,
};

/// `{{{region name="..."}}}` declarations.
static REGION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{\{\{~?\s*region\s+name\s*=\s*["']([^"']+)["']"#)
        .expect("region pattern is a valid regex")
});

/// A named insertion point declared by a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// Region name.
    pub name: String,
}

/// Regions keyed by template path. Templates without regions are omitted.
pub type RegionMap = BTreeMap<String, Vec<Region>>;

/// Extracts `{{{region name="..."}}}` declarations.
///
/// Regions declared by expanded partials count toward the including
/// template. Names are deduplicated, first occurrence wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct HandlebarsRegionExtractor;

impl RegionExtractor for HandlebarsRegionExtractor {
    fn extract(&self, templates: &TemplateSet, template_paths: &[String]) -> RegionMap {
        let mut regions = RegionMap::new();
        // Declarations per template path, scanned once
        let mut declared: HashMap<&str, Vec<&str>> = HashMap::new();

        for path in template_paths {
            let Some(template) = templates.get(path) else {
                continue;
            };

            let mut seen = HashSet::new();
            let mut found = Vec::new();
            template.walk(|node| {
                let names = declared.entry(node.path.as_str()).or_insert_with(|| {
                    REGION_PATTERN
                        .captures_iter(&node.content)
                        .filter_map(|c| c.get(1))
                        .map(|m| m.as_str())
                        .collect()
                });
                for name in names.iter() {
                    if seen.insert(*name) {
                        found.push(Region {
                            name: name.to_string(),
                        });
                    }
                }
            });

            if !found.is_empty() {
                regions.insert(path.clone(), found);
            }
        }

        regions
    }
}
