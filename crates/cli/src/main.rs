mod backfill;
mod cli;
mod config;
mod console;
mod generate;
mod logging;
mod report;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, Command};
use crate::config::{
    load_config, resolve_backfill, resolve_generate, BackfillConfig, GenerateConfig,
    DEFAULT_CONFIG,
};
use crate::console::Console;

enum Job {
    Generate(GenerateConfig),
    Backfill(BackfillConfig),
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let verbose = cli.verbose || logging::env_flag();
    logging::init(verbose);

    let job = match prepare(&cli, verbose) {
        Ok(job) => job,
        Err(err) => {
            report_setup_error(io::stdout().lock(), &err)?;
            return Ok(ExitCode::FAILURE);
        }
    };
    let report = match job {
        Job::Generate(cfg) => generate::run(&cfg)?,
        Job::Backfill(cfg) => backfill::run(&cfg)?,
    };
    Ok(if report.succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Loads the config file and resolves the options of the chosen command.
fn prepare(cli: &Cli, verbose: bool) -> Result<Job> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let file_config = load_config(&config_path)?;
    Ok(match &cli.command {
        Command::Generate(args) => {
            Job::Generate(resolve_generate(args, &file_config.generate, verbose)?)
        }
        Command::Backfill(args) => Job::Backfill(resolve_backfill(args, &file_config.backfill)?),
    })
}

fn report_setup_error<W: Write>(out: W, err: &anyhow::Error) -> io::Result<()> {
    Console::new(out).error(format!("{err:#}"))
}
