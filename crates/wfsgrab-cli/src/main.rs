mod cli;
mod commands;
mod error;
mod layers;
mod logging;
mod output;

use clap::Parser;
use std::process::ExitCode;

use crate::cli::Cli;
use crate::error::CliError;

/// Exit code for a run that finished but left gaps or failed layers.
const EXIT_GAPS: u8 = 3;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run() -> Result<ExitCode, CliError> {
    let cli = Cli::parse();
    logging::init(&cli.log_level, cli.log_file.as_deref())?;

    let result = commands::run(&cli).await?;
    output::render(&result.payload, cli.pretty)?;

    if result.needs_attention {
        return Ok(ExitCode::from(EXIT_GAPS));
    }

    Ok(ExitCode::SUCCESS)
}
