//! `certman` interactive shell entry point.
//!
//! # Responsibility
//! - Load configuration, start logging, open both stores.
//! - Hand stdin/stdout to the command loop.

mod render;
mod shell;

use certman_core::db::open_db;
use certman_core::{init_logging, CertmanConfig, FileStore};
use clap::Parser;
use std::error::Error;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "certman", version, about = "Certificate credentials manager")]
struct CliArgs {
    /// Path to config file
    #[arg(short, long, default_value = "certman.toml")]
    config: PathBuf,

    /// Log level (overrides config file)
    #[arg(short, long)]
    log_level: Option<String>,
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("certman: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: CliArgs) -> Result<(), Box<dyn Error>> {
    let mut config = CertmanConfig::load_or_default(&args.config)?;
    if let Some(level) = args.log_level {
        config.log_level = level;
    }
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir)?;
    }

    let files = FileStore::new(&config.store_path);
    files.ensure_root()?;
    let conn = open_db(&config.db)?;

    let stdin = io::stdin();
    let mut shell = shell::Shell::new(&config, files, &conn, stdin.lock(), io::stdout());
    shell.run()?;
    Ok(())
}
