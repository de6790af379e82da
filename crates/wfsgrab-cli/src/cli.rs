//! CLI argument definitions for wfsgrab.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `download` | Download layers into GeoJSON files |
//! | `count` | Print upstream totals without downloading |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--log-level` | `info` | Log filter when `RUST_LOG` is unset |
//! | `--log-file` | none | Also append logs to this file |
//!
//! # Examples
//!
//! ```bash
//! wfsgrab download govmap:parcels govmap:roads
//! wfsgrab download --layers-file layers.csv --chunk-size 1000 --pretty
//! wfsgrab count --layers-file layers.csv
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Bulk WFS layer downloader with adaptive page sizes.
#[derive(Debug, Parser)]
#[command(
    name = "wfsgrab",
    author,
    version,
    about = "Bulk WFS layer downloader with adaptive page sizes",
    long_about = "wfsgrab pages through every feature of one or more WFS layers and writes \
each layer to a GeoJSON file. Pages that time out are retried as smaller pages; ranges \
that never answer are reported with the URL needed to fetch them by hand.\n\
\n\
Use 'wfsgrab <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Append logs to this file as well as stderr.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Download layers, skipping ones whose output is already complete.
    ///
    /// # Examples
    ///
    ///   wfsgrab download govmap:parcels
    ///   wfsgrab download --layers-file layers.csv --force
    Download(DownloadArgs),

    /// Print the upstream feature count of each layer.
    Count(CountArgs),
}

/// Where the layer names come from.
#[derive(Debug, Clone, Args)]
pub struct LayerArgs {
    /// Layer names, e.g. govmap:parcels.
    pub layers: Vec<String>,

    /// CSV (or one-name-per-line) file listing layers.
    #[arg(long)]
    pub layers_file: Option<PathBuf>,

    /// CSV header of the layer name column.
    #[arg(long, default_value = "Layer Name")]
    pub column: String,
}

/// Upstream connection settings shared by every command.
#[derive(Debug, Clone, Args)]
pub struct UpstreamArgs {
    /// TOML configuration file; flags override its values.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// WFS endpoint.
    #[arg(long)]
    pub base_url: Option<String>,

    /// Timeout of every upstream request, in milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Args)]
pub struct DownloadArgs {
    #[command(flatten)]
    pub layers: LayerArgs,

    #[command(flatten)]
    pub upstream: UpstreamArgs,

    /// Records requested per page.
    #[arg(long)]
    pub chunk_size: Option<u64>,

    /// Smallest page the shrink retry may request.
    #[arg(long)]
    pub min_chunk: Option<u64>,

    /// Pause after every page, in milliseconds.
    #[arg(long)]
    pub chunk_delay_ms: Option<u64>,

    /// Pause between layers, in milliseconds.
    #[arg(long)]
    pub layer_delay_ms: Option<u64>,

    /// Re-download layers whose output already matches upstream.
    #[arg(long, default_value_t = false)]
    pub force: bool,

    /// Pages of one layer allowed in flight at once.
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Directory receiving one GeoJSON file per layer.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Park fetched pages here as chunk files until the layer is assembled.
    #[arg(long)]
    pub spool_dir: Option<PathBuf>,

    /// CRS declared on the written files.
    #[arg(long)]
    pub target_crs: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct CountArgs {
    #[command(flatten)]
    pub layers: LayerArgs,

    #[command(flatten)]
    pub upstream: UpstreamArgs,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn download_flags_are_parsed() {
        let cli = Cli::try_parse_from([
            "wfsgrab",
            "--pretty",
            "download",
            "ns:roads",
            "--chunk-size",
            "500",
            "--force",
            "--concurrency",
            "2",
            "--timeout-ms",
            "5000",
        ])
        .expect("valid arguments");

        assert!(cli.pretty);
        let Command::Download(args) = cli.command else {
            panic!("expected download");
        };
        assert_eq!(args.layers.layers, ["ns:roads"]);
        assert_eq!(args.layers.column, "Layer Name");
        assert_eq!(args.chunk_size, Some(500));
        assert_eq!(args.concurrency, Some(2));
        assert_eq!(args.upstream.timeout_ms, Some(5_000));
        assert!(args.force);
    }
}
