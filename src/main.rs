use std::process::ExitCode;

use clap::Parser;
use easel::{cli, logger};

fn main() -> ExitCode {
    // Initialize session log (overwrites previous session log)
    logger::init();
    let args = cli::CliArgs::parse();
    cli::run(args)
}
