//! Bundle manifest.

use crate::bundler::{
    Result,
    collaborators::{RegionExtractor, RegionMap, TemplateSet},
    utils::fs::list_template_files,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Summary of the bundle's regions and templates for the consuming runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Regions declared per template.
    pub regions: RegionMap,
    /// Every template on disk: unix separators, no extension, sorted.
    pub templates: Vec<String>,
}

/// Builds the manifest from the on-disk template list and the parsed templates.
///
/// The template list is read from disk rather than taken from the parsed set,
/// so it always reflects the `.html` files actually shipped in the archive.
pub async fn build_manifest(
    templates_root: &Path,
    templates: &TemplateSet,
    extractor: &dyn RegionExtractor,
) -> Result<Manifest> {
    let template_paths = list_template_files(templates_root).await?;
    let regions = extractor.extract(templates, &template_paths);

    log::info!(
        "Manifest: {} template(s), {} with regions",
        template_paths.len(),
        regions.len()
    );

    Ok(Manifest {
        regions,
        templates: template_paths,
    })
}
