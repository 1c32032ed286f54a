pub mod load;

use clap::{Parser, Subcommand};
pub use load::LoadArgs;

#[derive(Parser, Debug)]
#[command(
    name = "dorisload",
    version,
    about = "dorisload - bulk loading into Apache Doris over stream load",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load records, one per line, from files or stdin into a table.
    ///
    /// Example:
    ///   dorisload load --url http://fe:8030 --db shop --table orders orders.csv
    ///   cat events.json | dorisload load --url http://fe:8030 --db app --table events --format json
    Load(LoadArgs),
}
