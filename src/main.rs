//! Theme Bundler - packages a storefront theme into a zip bundle.
//!
//! This binary validates a theme, parses its sources and writes one archive
//! with exit codes that distinguish size-limit failures from other errors.

use std::process;
use theme_bundler::cli;

#[tokio::main]
async fn main() {
    let args = cli::parse_args();

    // Initialize logging; RUST_LOG takes precedence over --verbose
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_filter()))
        .init();

    let exit_code = match cli::run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            for suggestion in e.recovery_suggestions() {
                eprintln!("  hint: {}", suggestion);
            }
            e.exit_code()
        }
    };

    process::exit(exit_code);
}
