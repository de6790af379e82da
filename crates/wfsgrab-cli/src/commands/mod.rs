mod count;
mod download;

use serde_json::Value;
use wfsgrab_core::HarvestConfig;

use crate::cli::{Cli, Command, UpstreamArgs};
use crate::error::CliError;

pub struct CommandResult {
    pub payload: Value,
    /// Some layer ended with gaps, failed, or could not be counted.
    pub needs_attention: bool,
}

pub async fn run(cli: &Cli) -> Result<CommandResult, CliError> {
    match &cli.command {
        Command::Download(args) => download::run(args).await,
        Command::Count(args) => count::run(args).await,
    }
}

/// Defaults, then the `--config` file, then connection flags.
fn base_config(upstream: &UpstreamArgs) -> Result<HarvestConfig, CliError> {
    let mut config = match &upstream.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|source| CliError::File {
                path: path.clone(),
                source,
            })?;
            HarvestConfig::from_toml_str(&text)?
        }
        None => HarvestConfig::default(),
    };

    if let Some(base_url) = &upstream.base_url {
        config.base_url.clone_from(base_url);
    }
    if let Some(timeout_ms) = upstream.timeout_ms {
        config.page_timeout_ms = timeout_ms;
        config.count_timeout_ms = timeout_ms;
    }

    Ok(config)
}
