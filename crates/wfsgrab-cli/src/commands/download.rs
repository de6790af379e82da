use tracing::{info, warn};
use wfsgrab_core::{HarvestConfig, Harvester};

use crate::cli::DownloadArgs;
use crate::error::CliError;
use crate::layers;

use super::{base_config, CommandResult};

pub async fn run(args: &DownloadArgs) -> Result<CommandResult, CliError> {
    let layers = layers::collect(&args.layers)?;
    let config = build_config(args)?;
    announce(layers.len(), &config);
    let harvester = Harvester::from_config(config)?;

    let report = harvester.run(&layers).await;
    if report.has_gaps() {
        warn!(
            partial = report.totals.partial_with_gaps,
            failed = report.totals.failed,
            "run finished with layers needing attention"
        );
    }

    Ok(CommandResult {
        payload: serde_json::to_value(&report)?,
        needs_attention: report.has_gaps(),
    })
}

fn announce(layer_count: usize, config: &HarvestConfig) {
    info!(
        layers = layer_count,
        base_url = %config.base_url,
        output_dir = %config.output_dir.display(),
        chunk_size = config.chunk_size,
        "starting download"
    );
}

fn build_config(args: &DownloadArgs) -> Result<HarvestConfig, CliError> {
    let mut config = base_config(&args.upstream)?;

    if let Some(chunk_size) = args.chunk_size {
        config.chunk_size = chunk_size;
    }
    if let Some(min_chunk) = args.min_chunk {
        config.min_chunk = min_chunk;
    }
    if let Some(delay) = args.chunk_delay_ms {
        config.chunk_delay_ms = delay;
    }
    if let Some(delay) = args.layer_delay_ms {
        config.layer_delay_ms = delay;
    }
    if let Some(concurrency) = args.concurrency {
        config.max_concurrent_windows = concurrency;
    }
    if let Some(output_dir) = &args.output_dir {
        config.output_dir.clone_from(output_dir);
    }
    if let Some(spool_dir) = &args.spool_dir {
        config.spool_dir = Some(spool_dir.clone());
    }
    if let Some(target_crs) = &args.target_crs {
        config.target_crs.clone_from(target_crs);
    }
    config.force_overwrite |= args.force;

    config.validate()?;
    Ok(config)
}
