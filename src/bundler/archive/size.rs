//! Post-write size limits.
//!
//! Limits are checked after the archive has been written and closed. A
//! violation fails the build but leaves the archive on disk.

use crate::bundler::error::SizeViolation;

/// Largest allowed parsed template document, exclusive (1 MiB).
pub const MAX_TEMPLATE_BYTES: u64 = 1_048_576;

/// Largest allowed bundle, inclusive (50 MiB).
pub const MAX_BUNDLE_BYTES: u64 = 52_428_800;

/// Size limits applied to a finished bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizePolicy {
    /// A parsed template document of this many bytes or more is offending.
    pub max_template_bytes: u64,
    /// A bundle larger than this many bytes fails.
    pub max_bundle_bytes: u64,
}

impl Default for SizePolicy {
    fn default() -> Self {
        Self {
            max_template_bytes: MAX_TEMPLATE_BYTES,
            max_bundle_bytes: MAX_BUNDLE_BYTES,
        }
    }
}

/// Measurements of a finished bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeReport {
    /// Templates whose parsed document reached the per-template limit, sorted.
    pub offending_templates: Vec<String>,
    /// Size of the closed archive file.
    pub total_bytes: u64,
}

impl SizePolicy {
    /// Returns true if a parsed template document of `len` bytes is too large.
    pub fn is_oversized_template(&self, len: u64) -> bool {
        len >= self.max_template_bytes
    }

    /// Measures a finished bundle against this policy.
    pub fn evaluate<'a>(
        &self,
        template_sizes: impl IntoIterator<Item = (&'a str, u64)>,
        total_bytes: u64,
    ) -> SizeReport {
        let mut offending_templates: Vec<String> = template_sizes
            .into_iter()
            .filter(|(_, len)| self.is_oversized_template(*len))
            .map(|(path, _)| path.to_string())
            .collect();
        offending_templates.sort();

        SizeReport {
            offending_templates,
            total_bytes,
        }
    }

    /// Returns the violated limit, if any.
    ///
    /// Oversized templates take precedence over the total bundle size.
    pub fn check(&self, report: &SizeReport) -> Option<SizeViolation> {
        if !report.offending_templates.is_empty() {
            return Some(SizeViolation::OversizedTemplates {
                templates: report.offending_templates.clone(),
                limit: self.max_template_bytes,
            });
        }

        if report.total_bytes > self.max_bundle_bytes {
            return Some(SizeViolation::BundleTooLarge {
                size: report.total_bytes,
                limit: self.max_bundle_bytes,
            });
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_limit_is_inclusive() {
        let policy = SizePolicy::default();
        assert!(policy.is_oversized_template(1_048_576));
        assert!(!policy.is_oversized_template(1_048_575));
    }

    #[test]
    fn bundle_limit_is_exclusive() {
        let policy = SizePolicy::default();
        let at_limit = policy.evaluate(Vec::<(&str, u64)>::new(), MAX_BUNDLE_BYTES);
        assert_eq!(policy.check(&at_limit), None);

        let over = policy.evaluate(Vec::<(&str, u64)>::new(), MAX_BUNDLE_BYTES + 1);
        assert_eq!(
            policy.check(&over),
            Some(SizeViolation::BundleTooLarge {
                size: MAX_BUNDLE_BYTES + 1,
                limit: MAX_BUNDLE_BYTES
            })
        );
    }

    #[test]
    fn oversized_templates_take_precedence() {
        let policy = SizePolicy::default();
        let report = policy.evaluate(
            [
                ("pages/product", 2_000_000),
                ("pages/home", 1_048_576),
                ("pages/blog", 10),
            ],
            MAX_BUNDLE_BYTES * 2,
        );

        assert_eq!(report.offending_templates, vec!["pages/home", "pages/product"]);
        assert_eq!(
            policy.check(&report),
            Some(SizeViolation::OversizedTemplates {
                templates: vec!["pages/home".into(), "pages/product".into()],
                limit: MAX_TEMPLATE_BYTES,
            })
        );
    }

    #[test]
    fn custom_template_limit_is_reported() {
        let policy = SizePolicy {
            max_template_bytes: 4_096,
            ..Default::default()
        };
        let report = policy.evaluate([("pages/home", 5_000)], 10);

        let violation = policy.check(&report).unwrap();
        assert_eq!(
            violation,
            SizeViolation::OversizedTemplates {
                templates: vec!["pages/home".into()],
                limit: 4_096,
            }
        );
        let message = violation.to_string();
        assert!(message.contains("4096 byte"), "{message}");
        assert!(!message.contains("MiB"), "{message}");
    }
}
