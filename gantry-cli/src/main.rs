//! gantry: install JavaScript and TypeScript packages.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use gantry::config::ConfigFile;
use gantry::logging::{
    default_log_dir, default_log_file, init_logging_or_stderr, level_for_verbosity,
};
use tracing::info;

use commands::{AddArgs, ConsoleOutput, GlobalArgs, InitArgs, Session, Settings};
use error::CliError;

#[derive(Parser)]
#[command(name = "gantry")]
#[command(version, about = "Fast, concurrent package installer for JavaScript and TypeScript")]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a package.json in the project directory
    Init(InitArgs),

    /// Install packages and record them in package.json
    Add(AddArgs),

    /// Install every dependency listed in package.json
    Install,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let _logging = init_logging_or_stderr(
        &default_log_dir(),
        default_log_file(),
        level_for_verbosity(cli.global.verbose),
    );

    let config = ConfigFile::load().map_err(|e| CliError::Config(e.to_string()))?;
    let settings = Settings::resolve(&cli.global, &config)?;
    let output = ConsoleOutput::new();

    info!(version = env!("CARGO_PKG_VERSION"), "gantry starting");

    match cli.command {
        Commands::Init(args) => commands::init::run(&args, &settings, &output),
        Commands::Add(args) => {
            let session = Session::start(&settings)?;
            session.block_on(commands::add::run(
                &args,
                &session.orchestrator,
                &output,
                session.cancel_token(),
            ))
        }
        Commands::Install => {
            let session = Session::start(&settings)?;
            session.block_on(commands::install::run(
                &session.orchestrator,
                &output,
                session.cancel_token(),
            ))
        }
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
    fn test_parse_add_with_global_flags() {
        let cli = Cli::try_parse_from(["gantry", "add", "-D", "-j", "4", "jest", "ts-node"]).unwrap();
        assert_eq!(cli.global.concurrency, Some(4));
        match cli.command {
            Commands::Add(args) => {
                assert!(args.dev);
                assert_eq!(args.packages, vec!["jest", "ts-node"]);
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn test_add_requires_a_package() {
        assert!(Cli::try_parse_from(["gantry", "add"]).is_err());
    }
}
