use serde::Serialize;
use tracing::info;
use wfsgrab_core::{Harvester, LayerCount, LayerTotal};

use crate::cli::CountArgs;
use crate::error::CliError;
use crate::layers;

use super::{base_config, CommandResult};

#[derive(Debug, Serialize)]
struct CountResponseData {
    layers: Vec<LayerTotal>,
}

pub async fn run(args: &CountArgs) -> Result<CommandResult, CliError> {
    let layers = layers::collect(&args.layers)?;
    let harvester = Harvester::from_config(base_config(&args.upstream)?)?;
    info!(layers = layers.len(), "counting features");

    let totals = harvester.count(&layers).await;
    let needs_attention = totals
        .iter()
        .any(|total| matches!(total.count, LayerCount::Unavailable(_)));

    Ok(CommandResult {
        payload: serde_json::to_value(CountResponseData { layers: totals })?,
        needs_attention,
    })
}
