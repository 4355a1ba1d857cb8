//! Command-line interface definitions for the `drydock` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::Parser;

/// Top-level CLI for the `drydock` binary.
#[derive(Debug, Parser)]
#[command(
    name = "drydock",
    about = "Provision a build droplet and turn it into a reusable image",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Resolve configuration and print the droplet creation request.
    #[command(
        name = "plan",
        about = "Resolve configuration and print the droplet creation request"
    )]
    Plan(PlanCommand),
}

/// Arguments for the `drydock plan` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct PlanCommand {
    /// Override the region slug for this run.
    #[arg(long, value_name = "REGION")]
    pub(crate) region: Option<String>,
    /// Override the droplet size slug for this run.
    #[arg(long, value_name = "SIZE")]
    pub(crate) size: Option<String>,
    /// Override the base image for this run (numeric id or slug).
    #[arg(long, value_name = "IMAGE")]
    pub(crate) image: Option<String>,
}
