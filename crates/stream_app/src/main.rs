//! Entry point for the `stream` activity search CLI.
mod platform;

use clap::Parser;

fn main() -> anyhow::Result<()> {
    platform::run(platform::cli::Cli::parse())
}
