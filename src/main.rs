//! Binary entry point for the drydock CLI.

use std::io::{self, Write};
use std::process;

use clap::Parser;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use drydock::{ConfigError, CreationRequest, DropletConfig, UserDataError};

mod cli;

use cli::{Cli, PlanCommand};

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    UserData(#[from] UserDataError),
    #[error("failed to render creation request: {0}")]
    Render(#[from] serde_json::Error),
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match dispatch(cli, io::stdout()) {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn dispatch(cli: Cli, out: impl Write) -> Result<(), CliError> {
    match cli {
        Cli::Plan(command) => plan(&command, out),
    }
}

fn plan(args: &PlanCommand, out: impl Write) -> Result<(), CliError> {
    let mut config = DropletConfig::load_without_cli_args()?;
    apply_overrides(&mut config, args);
    config.validate()?;
    let request = CreationRequest::from_config(&config, None)?;
    render_request(&request, out)
}

fn apply_overrides(config: &mut DropletConfig, args: &PlanCommand) {
    if let Some(region) = &args.region {
        config.region.clone_from(region);
    }
    if let Some(size) = &args.size {
        config.size.clone_from(size);
    }
    if let Some(image) = &args.image {
        config.image.clone_from(image);
    }
}

fn render_request(request: &CreationRequest, mut out: impl Write) -> Result<(), CliError> {
    serde_json::to_writer_pretty(&mut out, request)?;
    writeln!(out)?;
    Ok(())
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}
