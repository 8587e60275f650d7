use anyhow::{Context, Result};
use clap::Parser;
use ecgview::Cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    // .env is optional
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .format_timestamp(None)
        .init();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every record was processed.
fn run(cli: &Cli) -> Result<bool> {
    if cli.run_all_records {
        log::info!("Analyzing every record in {}", cli.path.display());
    } else {
        log::info!(
            "Analyzing {} channel {} samples {}",
            cli.record,
            cli.channel,
            cli.window()
        );
    }
    let summary = ecgview::run(cli).with_context(|| {
        if cli.run_all_records {
            format!("analysis of {} failed", cli.path.display())
        } else {
            format!("analysis of record {} failed", cli.record)
        }
    })?;
    summary.log();
    Ok(summary.is_clean())
}
