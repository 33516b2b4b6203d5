use anyhow::Result;

mod cli;
mod config;
mod distpaths;

fn main() -> Result<()> {
    cli::run()
}
