//! PanelBridge CLI - Command-line interface
//!
//! Receives the simulator's export stream and drives panel bindings, and
//! offers offline tools for catalogs, formulas and binding files.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;
mod error;
mod runner;

use commands::config::ConfigCommands;
use error::CliError;
use runner::CliRunner;

#[derive(Debug, Parser)]
#[command(name = "panelbridge", version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log filter, e.g. debug or panelbridge=trace (overrides config)
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Receive the export stream and refresh bindings until Ctrl+C
    Run {
        /// Control catalog JSON files (repeatable)
        #[arg(long = "definitions", value_name = "FILE")]
        definitions: Vec<PathBuf>,

        /// Binding file
        #[arg(long, value_name = "FILE")]
        bindings: Option<PathBuf>,

        /// UDP port to listen on
        #[arg(long)]
        port: Option<u16>,

        /// Receive unicast only
        #[arg(long)]
        no_multicast: bool,
    },

    /// List controls in the catalog
    Controls {
        /// Control catalog JSON files (repeatable)
        #[arg(long = "definitions", value_name = "FILE")]
        definitions: Vec<PathBuf>,

        /// Only show controls whose identifier or category contains this text
        #[arg(long)]
        filter: Option<String>,
    },

    /// Evaluate a formula
    Eval {
        /// Expression, e.g. "(AAP_EGIPWR+1)/2"
        expression: String,

        /// Control value as NAME=VALUE (repeatable)
        #[arg(long = "set", value_name = "NAME=VALUE")]
        values: Vec<String>,

        /// Control catalog JSON files (repeatable)
        #[arg(long = "definitions", value_name = "FILE")]
        definitions: Vec<PathBuf>,
    },

    /// Validate a binding file
    Check {
        /// Binding file (defaults to bindings.file from config)
        file: Option<PathBuf>,

        /// Print the bindings in canonical form
        #[arg(long)]
        export: bool,

        /// Control catalog JSON files (repeatable)
        #[arg(long = "definitions", value_name = "FILE")]
        definitions: Vec<PathBuf>,
    },

    /// View or change configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match dispatch(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn dispatch(cli: Cli) -> Result<(), CliError> {
    let command = match cli.command {
        Commands::Config(command) => return commands::config::run(command, cli.config),
        other => other,
    };

    let runner = CliRunner::new(cli.config.as_deref(), cli.log_level.as_deref())?;

    match command {
        Commands::Run {
            definitions,
            bindings,
            port,
            no_multicast,
        } => commands::run::run(
            runner,
            commands::run::RunArgs {
                definitions,
                bindings,
                port,
                no_multicast,
            },
        ),
        Commands::Controls {
            definitions,
            filter,
        } => commands::controls::run(
            runner,
            commands::controls::ControlsArgs {
                definitions,
                filter,
            },
        ),
        Commands::Eval {
            expression,
            values,
            definitions,
        } => commands::eval::run(
            runner,
            commands::eval::EvalArgs {
                definitions,
                expression,
                values,
            },
        ),
        Commands::Check {
            file,
            export,
            definitions,
        } => commands::check::run(
            runner,
            commands::check::CheckArgs {
                definitions,
                file,
                export,
            },
        ),
        Commands::Config(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_eval() {
        let cli = Cli::parse_from([
            "panelbridge",
            "eval",
            "(AAP_EGIPWR+1)/2",
            "--set",
            "AAP_EGIPWR=4",
            "--definitions",
            "A-10C.json",
        ]);
        match cli.command {
            Commands::Eval {
                expression,
                values,
                definitions,
            } => {
                assert_eq!(expression, "(AAP_EGIPWR+1)/2");
                assert_eq!(values, vec!["AAP_EGIPWR=4".to_string()]);
                assert_eq!(definitions, vec![PathBuf::from("A-10C.json")]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_run_with_globals() {
        let cli = Cli::parse_from([
            "panelbridge",
            "run",
            "--port",
            "7778",
            "--no-multicast",
            "--log-level",
            "debug",
        ]);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(matches!(
            cli.command,
            Commands::Run {
                port: Some(7778),
                no_multicast: true,
                ..
            }
        ));
    }
}
