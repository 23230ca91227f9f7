//! `nbext`: inspect and edit which notebook extensions load, and their parameters.

mod bootstrap_helpers;

use anyhow::Result;
use clap::Parser;
use nbext_cli::Cli;
use nbext_runtime::run_cli;

use bootstrap_helpers::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    run_cli(cli).await
}
