mod book;
mod cli;
mod commands;
mod config;
mod datetime;
mod list;
mod logic;
mod model;
mod parser;
mod predicate;
mod sort;
mod storage;
mod telemetry;
mod tokenizer;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use config::Config;
use logic::Logic;
use storage::JsonFileStorage;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let config = Config::load(args.data).context("loading configuration")?;
    telemetry::init(&config).context("initializing logging")?;
    tracing::info!(data_file = %config.data_file.display(), "starting hustlehub");

    let storage = JsonFileStorage::new(&config.data_file);
    let (logic, warning) = Logic::load(storage);
    match args.command.unwrap_or(cli::Command::Tui) {
        cli::Command::Tui => ui::run(logic, warning),
        cli::Command::Run { words } => cli::run_once(logic, warning, &words.join(" ")),
        cli::Command::Repl => cli::repl(logic, warning),
    }
}
