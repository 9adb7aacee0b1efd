use anyhow::Context;
use colored::Colorize;
use stately_server::{ServerConfig, StatelyServer};
use tracing::info;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args).await,
        Command::Config => cmd_config(),
    }
}

/// Resolve the effective configuration for `serve`.
fn load_config(args: &ServeArgs) -> anyhow::Result<ServerConfig> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    Ok(config)
}

async fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = load_config(&args)?;
    let server = StatelyServer::from_config(config).context("building server")?;
    let listener = server.bind().await.context("starting server")?;
    println!(
        "{} Stately serving {} on {}",
        "✓".green().bold(),
        server.config().base_path.yellow(),
        listener.local_addr()?.to_string().bold()
    );
    server.serve_on(listener).await.context("server terminated")?;
    info!("server stopped");
    Ok(())
}

fn cmd_config() -> anyhow::Result<()> {
    let text = ServerConfig::default()
        .to_toml_string()
        .context("rendering default configuration")?;
    print!("{text}");
    Ok(())
}
