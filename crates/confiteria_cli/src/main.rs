//! Confitería product registry CLI.
//!
//! # Responsibility
//! - Resolve configuration from file, flags and environment.
//! - Open the configured storage backing and dispatch one subcommand.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser};
use confiteria_core::db::open_db;
use confiteria_core::{
    default_log_level, init_logging, CsvProductRepository, ProductService, RegistryConfig,
    SqliteProductRepository, StorageBackend,
};
use log::info;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "confiteria", about = "Registro de productos de confitería", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: commands::Command,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    /// JSON configuration file; defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Storage backing: csv or sqlite
    #[arg(long, global = true)]
    store: Option<StorageBackend>,

    /// Directory holding the store files
    #[arg(long, global = true, env = "CONFITERIA_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Directory for rolling log files; file logging is off when omitted
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    if let Err(error) = run(cli) {
        eprintln!("{error}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let config = resolve_config(cli.global)?;
    start_logging(&config)?;

    let catalog = config.catalog().map_err(|error| error.to_string())?;
    let tokens = config.on_sale_tokens().map_err(|error| error.to_string())?;

    if let commands::Command::Categories = cli.command {
        return commands::print_categories(&catalog);
    }

    info!(
        "event=cli_start module=cli status=ok storage={} command={}",
        config.storage,
        cli.command.name()
    );

    match config.storage {
        StorageBackend::Csv => {
            let repo = CsvProductRepository::new(config.csv_path(), catalog.clone());
            commands::run(cli.command, ProductService::new(repo, catalog, tokens))
        }
        StorageBackend::Sqlite => {
            let path = config.sqlite_path();
            let conn = open_db(&path).map_err(|error| {
                format!("no se pudo abrir la base de datos `{}`: {error}", path.display())
            })?;
            let repo = SqliteProductRepository::try_new(&conn, catalog.clone())
                .map_err(|error| error.to_string())?;
            commands::run(cli.command, ProductService::new(repo, catalog, tokens))
        }
    }
}

fn resolve_config(global: GlobalArgs) -> Result<RegistryConfig, String> {
    let mut config = match global.config {
        Some(path) => RegistryConfig::load(&path).map_err(|error| error.to_string())?,
        None => RegistryConfig::default(),
    };

    if let Some(store) = global.store {
        config.storage = store;
    }
    if let Some(data_dir) = global.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(level) = global.log_level {
        config.log_level = Some(level);
    }
    if let Some(log_dir) = global.log_dir {
        config.log_dir = Some(log_dir);
    }

    Ok(config)
}

fn start_logging(config: &RegistryConfig) -> Result<(), String> {
    let Some(log_dir) = config.log_dir.as_deref() else {
        return Ok(());
    };

    let level = config.log_level.as_deref().unwrap_or(default_log_level());
    init_logging(level, &absolute(log_dir)?).map_err(|error| error.to_string())
}

fn absolute(path: &Path) -> Result<PathBuf, String> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|error| format!("failed to resolve `{}`: {error}", path.display()))
}
