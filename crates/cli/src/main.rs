//! Entry point for the `ccapi` command-line tool

mod cli;
mod commands;
mod output;

use clap::Parser;
use colored::Colorize;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = cli.execute().await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
