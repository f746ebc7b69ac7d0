//! Command line interface for the theme bundler.
//!
//! Parses arguments, wires the default collaborators into a [`Bundler`] and
//! reports the finished archive.

mod args;

pub use args::Args;

use crate::{
    bundler::{
        Bundler, Collaborators, ThemeContextBuilder, calculate_sha256,
        collaborators::CommandBuildWorker,
    },
    error::{CliError, EXIT_SUCCESS, Result},
};
use anyhow::Context as _;
use std::sync::Arc;

/// Main CLI entry point
///
/// Returns the process exit code on success; failures are returned as errors
/// and mapped to exit codes by the caller.
pub async fn run(args: Args) -> Result<i32> {
    args.validate()
        .map_err(|reason| CliError::InvalidArguments { reason })?;

    let context = ThemeContextBuilder::new()
        .theme_root(&args.theme_root)
        .options(args.build_options())
        .build()
        .await?;

    let mut collaborators = Collaborators::defaults(context.theme_root());
    if let Some(command) = &args.build_command {
        log::debug!("Using build command: {}", command);
        collaborators = collaborators.with_build_worker(Arc::new(CommandBuildWorker::new(command)));
    }

    let bundler = Bundler::new(context, collaborators);
    let archive = bundler.build_bundle().await?;

    let size = tokio::fs::metadata(&archive)
        .await
        .with_context(|| format!("reading metadata of {}", archive.display()))?
        .len();
    let checksum = calculate_sha256(&archive).await?;

    println!("Bundle created: {}", archive.display());
    println!("  Size:   {} bytes", size);
    println!("  SHA256: {}", checksum);

    Ok(EXIT_SUCCESS)
}

/// Parse arguments without executing
pub fn parse_args() -> Args {
    Args::parse_args()
}
