use std::process::ExitCode;

use clap::Parser;

mod commands;
mod input;
mod summary;

use commands::{Cli, Command};
use dorisload_runtime::logging;

fn main() -> ExitCode {
    logging::init().ok();

    let cli = Cli::parse();
    match cli.command {
        Command::Load(args) => commands::load::run(args),
    }
}
