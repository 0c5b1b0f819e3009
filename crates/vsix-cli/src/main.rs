//! # vsix-cli
//!
//! Downloads VS Code extension packages by identifier and hands each one to
//! the `code` command line installer.
//!
//! This is the entry point for the `vsix` binary. It parses arguments, sets up
//! logging and the panic hook, runs the fetch on a Tokio runtime and maps the
//! result to the process exit code.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use vsix_core::error::{VsixError, VsixResult};

mod commands;
mod output;

use commands::{CommandContext, FetchArgs};
use output::errors::ErrorFormatter;

/// Download and install VS Code extensions from a gallery
#[derive(Parser, Debug)]
#[command(name = "vsix", version, about = "VS Code VSIX downloader and installer")]
pub struct Cli {
    #[command(flatten)]
    pub fetch: FetchArgs,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose);
    setup_panic_handler();

    info!("Starting vsix v{}", env!("CARGO_PKG_VERSION"));

    match run_cli(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("Execution error: {}", err);
            eprintln!("{}", ErrorFormatter::new().format_error(&err));
            ExitCode::FAILURE
        }
    }
}

fn run_cli(cli: Cli) -> VsixResult<()> {
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| VsixError::io("Failed to create async runtime".to_string(), e))?;

    rt.block_on(async {
        let ctx = CommandContext::new()?;
        commands::execute(cli.fetch, &ctx).await
    })
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "vsix={l},vsix_core={l},vsix_config={l},vsix_registry={l},vsix_installer={l}",
            l = level
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("vsix encountered an unexpected error: {}", panic_info);
        eprintln!("vsix crashed! This is a bug.");
        eprintln!("Error: {}", panic_info);
    }));
}
