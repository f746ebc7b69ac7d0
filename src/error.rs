//! Error types for the command line front end.
//!
//! Wraps bundle failures with CLI errors, maps them to exit codes and offers
//! recovery suggestions.

use crate::bundler::{self, SizeViolation};
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, BundlerError>;

/// Exit code for a successful bundle.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for any failure other than a size limit.
pub const EXIT_FAILURE: i32 = 1;
/// Exit code when the archive was written but breaks a size limit.
pub const EXIT_SIZE_LIMIT: i32 = 2;

/// Main error type for the command line front end
#[derive(Error, Debug)]
pub enum BundlerError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Bundle assembly errors
    #[error("Bundler error: {0}")]
    Bundler(#[from] bundler::Error),

    /// Generic errors from anyhow
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },
}

impl BundlerError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            BundlerError::Bundler(e) if matches!(e.root(), bundler::Error::SizeLimit { .. }) => {
                EXIT_SIZE_LIMIT
            }
            _ => EXIT_FAILURE,
        }
    }

    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        let BundlerError::Bundler(error) = self else {
            return match self {
                BundlerError::Cli(_) => {
                vec!["Run with --help to see the accepted arguments".into()]
            }
                _ => vec!["Check the error message above for specific details".into()],
            };
        };

        match error.root() {
            bundler::Error::Validation(_) => vec![
                "Make sure config.json and the templates directory exist in the theme root".into(),
                "Use --theme-root to point at the theme if it is not the current directory".into(),
            ],
            bundler::Error::CycleDetected { cycle } => vec![format!(
                "Remove one of the partial includes between: {}",
                cycle.join(", ")
            )],
            bundler::Error::ObjectReference(_) => {
                vec!["Create the missing partials or remove the includes that name them".into()]
            }
            bundler::Error::SizeLimit { archive, violation } => {
                let mut hints = match violation {
                    SizeViolation::OversizedTemplates { .. } => vec![
                        "Split the listed templates into smaller partials".into(),
                    ],
                    SizeViolation::BundleTooLarge { .. } => vec![
                        "Move large static assets to assets/cdn, which is not bundled".into(),
                        "Remove unused images and fonts from assets/".into(),
                    ],
                };
                hints.push(format!(
                    "The oversized archive was left at {} for inspection",
                    archive.display()
                ));
                hints
            }
            _ => vec!["Run with --verbose for per-file details".into()],
        }
    }
}
