use crate::commands::{help_text, CommandResult};
use crate::logic::{Logic, LogicError};
use crate::storage::ApplicationStorage;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "hustlehub", version, about = "Keyboard-driven job application tracker")]
pub struct Cli {
    /// Use this data file instead of the configured one
    #[arg(long, global = true, value_name = "FILE")]
    pub data: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Launch the interactive TUI
    Tui,
    /// Run a single command line, e.g. `hustlehub run sort deadline desc`
    Run {
        /// The command and its arguments
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        words: Vec<String>,
    },
    /// Read commands from standard input, one per line
    Repl,
}

pub fn run_once<S: ApplicationStorage>(
    mut logic: Logic<S>,
    warning: Option<String>,
    line: &str,
) -> Result<()> {
    if let Some(warning) = warning {
        eprintln!("Warning: {}", warning);
    }
    let result = logic.execute(line)?;
    let mut out = io::stdout().lock();
    print_result(&mut out, &logic, &result)?;
    Ok(())
}

pub fn repl<S: ApplicationStorage>(mut logic: Logic<S>, warning: Option<String>) -> Result<()> {
    if let Some(warning) = warning {
        eprintln!("Warning: {}", warning);
    }
    let stdin = io::stdin();
    let mut out = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line.context("reading command from stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        match logic.execute(&line) {
            Ok(result) => {
                print_result(&mut out, &logic, &result)?;
                if result.should_exit {
                    break;
                }
            }
            Err(LogicError::Persist { result, source }) => {
                eprintln!("Error: {}\nCould not save data to file: {}", result.message, source);
                if result.should_exit {
                    break;
                }
            }
            Err(err) => eprintln!("Error: {}", err),
        }
    }
    out.flush()?;
    Ok(())
}

fn print_result<S: ApplicationStorage>(
    out: &mut impl Write,
    logic: &Logic<S>,
    result: &CommandResult,
) -> io::Result<()> {
    writeln!(out, "{}", result.message)?;
    if result.should_show_help {
        writeln!(out, "\n{}", help_text())?;
        return Ok(());
    }
    if result.should_exit {
        return Ok(());
    }
    let view = logic.view();
    if view.is_empty() {
        writeln!(out, "(no applications to show)")?;
    }
    for (idx, application) in view.iter().enumerate() {
        writeln!(out, "{}. {}", idx + 1, application)?;
    }
    Ok(())
}
