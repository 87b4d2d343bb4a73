use std::net::SocketAddr;
use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use storyfeed_core::FeedConfig;
use storyfeed_server::FeedServer;

use crate::cli::{Cli, Command, ConfigArgs, ServeArgs};

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args).await,
        Command::Config(args) => cmd_config(args),
    }
}

/// Config file if given, defaults otherwise, then the `--bind` override.
fn resolve_config(path: Option<&Path>, bind: Option<SocketAddr>) -> anyhow::Result<FeedConfig> {
    let mut config = match path {
        Some(path) => FeedConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => FeedConfig::default(),
    };
    if let Some(bind) = bind {
        config.server.bind_addr = bind;
    }
    Ok(config)
}

async fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = resolve_config(args.config.as_deref(), args.bind)?;
    let bind = config.server.bind_addr;
    let server = FeedServer::new(config).context("setting up storyfeed")?;
    println!("{} storyfeed listening on {}", "✓".green().bold(), bind.to_string().bold());
    server.serve().await?;
    Ok(())
}

fn cmd_config(args: ConfigArgs) -> anyhow::Result<()> {
    let config = resolve_config(args.config.as_deref(), None)?;
    print!("{}", config.to_toml_string()?);
    Ok(())
}
