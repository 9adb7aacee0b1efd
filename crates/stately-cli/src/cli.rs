use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "stately",
    about = "Stately: a remote state backend for Terraform and OpenTofu",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the state server
    Serve(ServeArgs),
    /// Print the default configuration as TOML
    Config,
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML configuration file; defaults apply when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Listen address, overriding the configuration file
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}
