use std::{fs::File, path::Path};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use paramtree::descriptor::ProcessDescriptor;
use simplelog::LevelFilter;

use crate::config;

mod fill;
mod inspect;

/// Builds, fills and checks process parameter forms from process descriptors.
#[derive(Parser)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Logging level.
    #[arg(long, default_value = "Warn")]
    log_level: LevelFilter,

    /// Options relating to the editor configuration.
    #[command(flatten)]
    config: config::ConfigArgs,
}

#[derive(Subcommand)]
enum Command {
    Inspect(inspect::Command),
    Fill(fill::Command),
}

pub fn run() -> Result<()> {
    let args = Args::parse();

    simplelog::SimpleLogger::init(args.log_level, simplelog::Config::default())
        .with_context(|| "configuring logging")?;

    let editors = args.config.load_editors()?;
    let mut out = std::io::stdout().lock();

    use Command::*;
    match &args.command {
        Inspect(cmd) => inspect::run(cmd, &editors, &mut out),
        Fill(cmd) => fill::run(cmd, editors, &mut out),
    }
}

/// Reads a process descriptor from a JSON file.
fn load_descriptor(path: &Path) -> Result<ProcessDescriptor> {
    let file = File::open(path).with_context(|| format!("opening descriptor {path:?}"))?;
    serde_json::from_reader(std::io::BufReader::new(file))
        .with_context(|| format!("parsing descriptor {path:?}"))
}
