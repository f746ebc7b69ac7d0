//! Default theme validation.

use super::{TemplateSet, ThemeValidator, config::CONFIG_FILE};
use crate::bundler::{
    Error, Result,
    settings::ThemeContext,
    utils::fs::{is_dir, is_file},
};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashSet};

/// Structural checks for a theme.
///
/// Always required: `config.json`, a `templates/` directory, and a non-blank
/// `name` and `version`. In marketplace mode the version must also be valid
/// semver, `meta/` must exist, and `meta.composed_image` must name a file in it.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultThemeValidator;

impl DefaultThemeValidator {
    async fn marketplace_problems(context: &ThemeContext) -> Vec<String> {
        let mut problems = Vec::new();
        let raw = context.raw_config();

        if let Some(version) = raw.version()
            && let Err(e) = semver::Version::parse(version)
        {
            problems.push(format!("version '{}' is not valid semver: {}", version, e));
        }

        let meta_dir = context.theme_root().join("meta");
        if !is_dir(&meta_dir).await {
            problems.push("missing meta/ directory".to_string());
        }

        match raw.meta.as_ref().and_then(|m| m.composed_image.as_deref()) {
            Some(image) => {
                if !is_file(&meta_dir.join(image)).await {
                    problems.push(format!("composed image meta/{} not found", image));
                }
            }
            None => problems.push("meta.composed_image is not set in config.json".to_string()),
        }

        problems
    }
}

#[async_trait]
impl ThemeValidator for DefaultThemeValidator {
    async fn validate_theme(&self, context: &ThemeContext) -> Result<()> {
        let mut problems = Vec::new();
        let root = context.theme_root();

        if !is_file(&root.join(CONFIG_FILE)).await {
            problems.push(format!("missing {}", CONFIG_FILE));
        }
        if !is_dir(&context.templates_root()).await {
            problems.push("missing templates/ directory".to_string());
        }

        let raw = context.raw_config();
        if raw.name().is_none() {
            problems.push("config.json has no name".to_string());
        }
        if raw.version().is_none() {
            problems.push("config.json has no version".to_string());
        }

        if context.options().marketplace {
            problems.extend(Self::marketplace_problems(context).await);
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(problems.join("; ")))
        }
    }

    async fn check_object_references(&self, templates: &TemplateSet) -> Result<()> {
        let mut dangling = BTreeSet::new();
        let mut seen = HashSet::new();

        for template in templates.values() {
            template.walk_pruned(|node| {
                if !seen.insert(node.path.as_str()) {
                    return false;
                }
                for partial in &node.partials {
                    if !templates.contains_key(&partial.name) {
                        dangling.insert(format!("{} -> {}", node.path, partial.name));
                    }
                }
                true
            });
        }

        if dangling.is_empty() {
            Ok(())
        } else {
            Err(Error::ObjectReference(format!(
                "unknown partial(s): {}",
                dangling.into_iter().collect::<Vec<_>>().join(", ")
            )))
        }
    }
}
