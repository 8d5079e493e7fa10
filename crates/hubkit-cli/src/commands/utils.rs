use anyhow::{Context, Result};
use hubkit::{Client, Config};
use serde::Serialize;
use tokio::runtime::Runtime;

use super::Cli;

/// Load the config, build a client from the environment and start it.
pub fn connect(cli: &Cli, rt: &Runtime) -> Result<Client> {
    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    let client = Client::from_env(&config)?;
    rt.block_on(client.start())
        .context("Failed to connect to GitHub")?;
    Ok(client)
}

/// Print a value as pretty JSON.
pub fn output_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
