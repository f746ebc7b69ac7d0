//! Raw theme configuration as read from `config.json`.

use serde::{Deserialize, Serialize};

/// Marketplace metadata block of `config.json`.
///
/// # Example
///
/// ```json
/// "meta": {
///     "author_name": "Example Inc.",
///     "composed_image": "composed.png"
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThemeMeta {
    /// Theme author shown in the marketplace.
    #[serde(default)]
    pub author_name: Option<String>,

    /// Preview image, relative to the theme's `meta/` directory.
    ///
    /// Required when bundling for the marketplace.
    #[serde(default)]
    pub composed_image: Option<String>,
}

/// Raw theme configuration.
///
/// Only the keys the bundler acts on are modelled; everything else in
/// `config.json` is carried into the archive verbatim as a raw entry.
///
/// # Example
///
/// ```json
/// {
///     "name": "Cornerstone",
///     "version": "6.1.0",
///     "css_compiler": "scss"
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawThemeConfig {
    /// Theme name.
    ///
    /// Used together with `version` to name the archive.
    #[serde(default)]
    pub name: Option<String>,

    /// Theme version, e.g. "6.1.0".
    #[serde(default)]
    pub version: Option<String>,

    /// Style compiler identifier, e.g. "scss".
    ///
    /// When absent the style-processing task is skipped entirely.
    #[serde(default)]
    pub css_compiler: Option<String>,

    /// Marketplace metadata.
    #[serde(default)]
    pub meta: Option<ThemeMeta>,
}

impl RawThemeConfig {
    /// Returns the configured style compiler, ignoring blank values.
    pub fn css_compiler(&self) -> Option<&str> {
        non_blank(self.css_compiler.as_deref())
    }

    /// Returns the theme name, ignoring blank values.
    pub fn name(&self) -> Option<&str> {
        non_blank(self.name.as_deref())
    }

    /// Returns the theme version, ignoring blank values.
    pub fn version(&self) -> Option<&str> {
        non_blank(self.version.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_keys_are_ignored() {
        let raw: RawThemeConfig = serde_json::from_str(
            concat!(
                r#"{"name":"Cornerstone","version":"6.1.0","#,
                r#""settings":{"color":"red"},"variations":[]}"#
            ),
        )
        .unwrap();
        assert_eq!(raw.name(), Some("Cornerstone"));
        assert_eq!(raw.version(), Some("6.1.0"));
        assert_eq!(raw.css_compiler(), None);
    }

    #[test]
    fn blank_compiler_is_treated_as_absent() {
        let raw: RawThemeConfig = serde_json::from_str(r#"{"css_compiler":"  "}"#).unwrap();
        assert_eq!(raw.css_compiler(), None);
    }
}
