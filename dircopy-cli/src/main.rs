//! Main entry point for the dircopy CLI.
//!
//! This is the command-line interface for reconciling a directory tree
//! with a tar archive:
//! - `sync`: Make a destination match an archive
//! - `diff`: Show which archive entries differ from a destination
//! - `list`: List archive entries
//! - `validate`: Check configuration and show the resolved target

mod cli;
mod commands;
mod error;
mod utils;

use clap::Parser;
use cli::Cli;
use utils::GlobalOptions;

fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Route library logging to stderr based on verbosity
    let logger = dircopy::init_logger(cli.verbose, cli.quiet);
    logger.install();

    let global = GlobalOptions {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config_dir: cli.config_dir,
        no_config: cli.no_config,
    };

    let result = match cli.command {
        cli::Command::Sync(cmd) => cmd.execute(&global),
        cli::Command::Diff(cmd) => cmd.execute(&global),
        cli::Command::List(cmd) => cmd.execute(&global),
        cli::Command::Validate(cmd) => cmd.execute(&global),
        cli::Command::Completions(cmd) => cmd.execute(&global),
    };

    // Handle errors and set exit code
    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
