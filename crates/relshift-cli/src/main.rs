//! relshift command-line runner
//!
//! Loads a directive file, applies it to a SQLite database and prints the
//! report.

mod formatter;

use clap::Parser;
use formatter::OutputFormat;
use relshift_core::sql::SqliteExecutor;
use relshift_core::{load_migration_set, MigrationConfig, MigrationEngine};
use std::path::PathBuf;

/// relshift - relation migration runner
#[derive(Parser, Debug)]
#[command(name = "relshift")]
#[command(version, about = "Apply relation migrations to a SQLite database")]
pub struct Args {
    /// SQLite database file to migrate
    #[arg(short, long)]
    pub database: PathBuf,

    /// Directive file (.yml, .yaml or .json)
    #[arg(short, long)]
    pub config: PathBuf,

    /// Output format
    #[arg(long, default_value = "table", value_enum)]
    pub format: OutputFormat,

    /// Check the schema and list planned statements without changing anything
    #[arg(long)]
    pub dry_run: bool,
}

impl Args {
    /// Engine configuration derived from the arguments.
    pub fn migration_config(&self) -> MigrationConfig {
        MigrationConfig::default().with_dry_run(self.dry_run)
    }
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relshift=info,relshift_core=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Run the migration; `Ok(false)` when any step failed.
fn run(args: Args) -> Result<bool, Box<dyn std::error::Error>> {
    let set = load_migration_set(&args.config)?;
    tracing::info!(
        config = %args.config.display(),
        database = %args.database.display(),
        directives = set.len(),
        "configuration loaded"
    );

    let executor = SqliteExecutor::open(&args.database)?;
    let engine = MigrationEngine::new(executor, args.migration_config());
    let report = engine.run(&set);

    let formatter = formatter::create_formatter(args.format);
    println!("{}", formatter.format_report(&report));

    Ok(!report.has_failures())
}
