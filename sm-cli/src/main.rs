//! sm-cli - Command line tool for StateMod binary time series output files.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "sm-cli",
    version,
    about = "Inspect and extract StateMod binary time series output"
)]
struct Cli {
    #[command(subcommand)]
    command: sm_cmd::Command,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    log::debug!("Starting sm-cli");
    sm_cmd::run(cli.command)
}
