//! sitegantt - Gantt timeline and reporting CLI over the core engine.

mod cli;

use clap::Parser;
use cli::Cli;

fn main() -> anyhow::Result<()> {
    Cli::parse().run()
}
