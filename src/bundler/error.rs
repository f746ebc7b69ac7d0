//! Error types for bundle assembly.
//!
//! Every failure the pipeline can surface is a variant of [`Error`]. Producer
//! failures are wrapped in [`Error::Task`] so callers can tell which task
//! failed; size-policy failures carry the path of the archive that was left on
//! disk.

use std::{
    fmt,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Result type alias for bundle operations
pub type Result<T> = std::result::Result<T, Error>;

/// Size limit that a finished archive violated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SizeViolation {
    /// Parsed templates whose JSON document reached the per-template limit.
    OversizedTemplates {
        /// Offending template paths, sorted
        templates: Vec<String>,
        /// Limit in bytes
        limit: u64,
    },
    /// The archive as a whole exceeded the bundle limit.
    BundleTooLarge {
        /// Measured archive size in bytes
        size: u64,
        /// Limit in bytes
        limit: u64,
    },
}

impl fmt::Display for SizeViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OversizedTemplates { templates, limit } => write!(
                f,
                "{} template(s) reach the {} byte parsed size limit: {}",
                templates.len(),
                limit,
                templates.join(", ")
            ),
            Self::BundleTooLarge { size, limit } => write!(
                f,
                "bundle is {} bytes, which exceeds the {} byte limit",
                size, limit
            ),
        }
    }
}

/// Main error type for bundle assembly.
#[derive(Error, Debug)]
pub enum Error {
    /// Pre-flight theme validation failed.
    #[error("Theme validation failed: {0}")]
    Validation(String),

    /// A producer task failed.
    #[error("Task '{task}' failed: {source}")]
    Task {
        /// Name of the failed task
        task: &'static str,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },

    /// A parsed template references an object or partial that does not exist.
    #[error("Invalid object reference: {0}")]
    ObjectReference(String),

    /// Templates include each other in a loop.
    #[error("Circular template dependency detected: {}", format_cycle(.cycle))]
    CycleDetected {
        /// Template paths forming the cycle, in traversal order
        cycle: Vec<String>,
    },

    /// The archive was written but violates a size limit.
    #[error("Bundle size limit exceeded ({violation}); archive left at {}", .archive.display())]
    SizeLimit {
        /// Archive that was written before the check
        archive: PathBuf,
        /// Limit that was violated
        violation: SizeViolation,
    },

    /// Filesystem operation failed on a known path.
    #[error("Failed {context} at {}: {error}", .path.display())]
    Fs {
        /// What was being attempted
        context: &'static str,
        /// Path involved
        path: PathBuf,
        /// Underlying error
        #[source]
        error: std::io::Error,
    },

    /// IO errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Archive writer errors
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Invalid glob pattern
    #[error("Pattern error: {0}")]
    Glob(#[from] glob::PatternError),

    /// Directory traversal errors
    #[error("Directory walk error: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// Anything else
    #[error("{0}")]
    GenericError(String),
}

impl Error {
    /// Wraps this error as the failure of the named producer task.
    pub fn in_task(self, task: &'static str) -> Self {
        match self {
            // Already attributed
            Error::Task { .. } => self,
            other => Error::Task {
                task,
                source: Box::new(other),
            },
        }
    }

    /// Returns the innermost error, looking through task attribution.
    pub fn root(&self) -> &Error {
        match self {
            Error::Task { source, .. } => source.root(),
            other => other,
        }
    }
}

fn format_cycle(cycle: &[String]) -> String {
    let mut parts: Vec<&str> = cycle.iter().map(String::as_str).collect();
    if let Some(first) = cycle.first() {
        parts.push(first);
    }
    parts.join(" -> ")
}

/// Attaches an action label and path to IO failures.
pub trait ErrorExt<T> {
    /// Converts an IO error into [`Error::Fs`].
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context,
            path: path.as_ref().to_path_buf(),
            error,
        })
    }
}

/// Converts missing values and foreign errors into [`Error::GenericError`].
pub trait Context<T> {
    /// Adds a message describing what was expected.
    fn context<C: fmt::Display>(self, context: C) -> Result<T>;
}

impl<T> Context<T> for Option<T> {
    fn context<C: fmt::Display>(self, context: C) -> Result<T> {
        self.ok_or_else(|| Error::GenericError(context.to_string()))
    }
}

impl<T> Context<T> for Result<T> {
    fn context<C: fmt::Display>(self, context: C) -> Result<T> {
        self.map_err(|e| Error::GenericError(format!("{context}: {e}")))
    }
}

/// Returns early with an [`Error::GenericError`] built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::bundler::Error::GenericError(format!($($arg)*)))
    };
}
