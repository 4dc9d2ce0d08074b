// cardmesh CLI - reconcile card catalogs exported by several providers

mod exit_codes;
mod recon;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use exit_codes::{EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "cardmesh")]
#[command(about = "Reconcile card catalogs across data providers")]
#[command(long_version = long_version())]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load every configured source, reconcile, and write the output documents
    #[command(after_help = "\
Examples:
  cardmesh run lorcana.recon.toml
  cardmesh run lorcana.recon.toml --out-dir build/ --scope 001,002
  cardmesh run lorcana.recon.toml --json > master.json
  cardmesh run lorcana.recon.toml --strict --quiet

Documents written to the output directory:
  master.json      Merged records split into playable cards and sealed products
  mismatches.json  Name disagreements grouped by category and set
  coverage.json    Per-set provider coverage with percentages
  flagged.json     High-value cards missing from the watched provider
  warnings.json    Data-quality warnings collected during the run

Exit codes:
  0   Success
  60  Invalid config
  61  Source could not be loaded
  62  Reconciliation aborted
  63  Output could not be written
  64  Issues found (--strict)")]
    Run(recon::RunArgs),

    /// Parse and validate a config file without loading any sources
    Validate {
        /// Path to the .recon.toml config file
        config: PathBuf,
    },

    /// Classify how two card names differ
    #[command(after_help = "\
Examples:
  cardmesh classify 'Elsa' 'elsa'
  cardmesh classify 'Mickey Mouse - Brave Little Tailor' 'Mickey Mouse'")]
    Classify {
        /// First name
        a: String,

        /// Second name
        b: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("CARDMESH_COMMIT"), ")",
        "\nengine:  cardmesh-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("CARDMESH_TARGET"),
    )
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("CARDMESH_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        None => {
            eprintln!("Usage: cardmesh <command> [options]");
            eprintln!("       cardmesh --help for more information");
            Ok(())
        }
        Some(Commands::Run(args)) => recon::cmd_run(args),
        Some(Commands::Validate { config }) => recon::cmd_validate(config),
        Some(Commands::Classify { a, b, json }) => recon::cmd_classify(a, b, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
