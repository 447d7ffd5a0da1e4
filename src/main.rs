//! migration-dialect CLI
//!
//! Entry point for the command-line tool.
//!
//! Exit codes:
//! - 0: Success
//! - 2: Tool error (config error, unsupported database, unterminated script, I/O error, etc.)

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use migration_dialect::config::OutputFormat;
use migration_dialect::{
    Config, Dialect, DialectFactory, DialectRegistry, MetadataSnapshot, SqlStatement,
};

/// Default config file name used when --config is not explicitly provided.
const DEFAULT_CONFIG_FILE: &str = "migration-dialect.toml";

#[derive(Parser, Debug)]
#[command(name = "migration-dialect")]
#[command(about = "Resolve database dialects and split SQL migration scripts", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the dialect handler resolved for a product identity (e.g. "H2 1.4")
    Resolve {
        identity: String,
    },

    /// Split a SQL script into statements using a database's dialect
    Split {
        /// Product identity of the target database (e.g. "PostgreSQL 16.2")
        #[arg(short, long)]
        database: String,

        /// Override output format
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,

        /// Script to split
        file: PathBuf,
    },
}

fn main() {
    init_tracing();
    let args = Args::parse();

    if let Err(err) = run(args) {
        eprintln!("Error: {:#}", err);
        std::process::exit(2);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: Args) -> Result<()> {
    let config = load_config(&args.config)?;

    let registry = DialectRegistry::new();
    config
        .apply(&registry)
        .context("Failed to register custom dialects")?;

    match args.command {
        Command::Resolve { identity } => {
            let descriptor = registry.lookup(&identity)?;
            println!("{}", descriptor.type_name());
        }
        Command::Split {
            database,
            format,
            file,
        } => {
            let source = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;

            let connection = MetadataSnapshot::from_identity(&database);
            let dialect = DialectFactory::new(&registry).create_dialect(&connection)?;
            let script = dialect
                .parse_script(&source)
                .with_context(|| format!("Failed to split {}", file.display()))?;

            match format.unwrap_or(config.output.format) {
                OutputFormat::Text => print_text(script.statements()),
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(script.statements())
                        .context("Failed to serialize statements")?
                ),
            }
        }
    }

    Ok(())
}

fn print_text(statements: &[SqlStatement]) {
    for (index, statement) in statements.iter().enumerate() {
        if index > 0 {
            println!();
        }
        println!(
            "-- statement {}, line {}",
            index + 1,
            statement.line_number()
        );
        println!("{}", statement.sql());
    }
}

/// Load configuration from file.
///
/// If `config_path` is `Some`, the user explicitly passed `--config` and the file
/// must exist (error if not found). If `None`, the default config path is used;
/// a missing default config file is not an error.
fn load_config(config_path: &Option<PathBuf>) -> Result<Config> {
    match config_path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Config::from_file(path).context("Failed to load configuration")
        }
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                Config::from_file(&default_path).context("Failed to load configuration")
            } else {
                tracing::debug!(
                    path = %default_path.display(),
                    "config file not found, using defaults"
                );
                Ok(Config::default())
            }
        }
    }
}
