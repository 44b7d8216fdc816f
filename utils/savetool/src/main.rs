use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use engine::{Engine, EngineConfig};
use storage::DirectoryStorage;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use vm::KernelDispatcher;

mod report;

/// Inspector for save games and kernel tables
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the header of a save file
    Info {
        file: PathBuf,

        /// Emit the header as JSON
        #[arg(long)]
        json: bool,
    },
    /// Restore a save against game data and list its heap
    Dump {
        file: PathBuf,

        /// Directory holding the game's script resources
        #[arg(short, long)]
        game: PathBuf,

        /// Platform the game was released for
        #[arg(short, long, default_value = "dos")]
        platform: String,

        /// Skip hex dumps of byte segments
        #[arg(long)]
        no_hex: bool,
    },
    /// Print the kernel table selected for an interpreter build
    Kernel {
        #[arg(long)]
        version: String,

        #[arg(long, default_value = "dos")]
        platform: String,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Info { file, json } => cmd_info(&file, json),
        Command::Dump {
            file,
            game,
            platform,
            no_hex,
        } => cmd_dump(&file, &game, platform, !no_hex),
        Command::Kernel { version, platform } => cmd_kernel(version, platform),
    }
}

fn read_save(file: &Path) -> Result<Vec<u8>> {
    fs::read(file).with_context(|| format!("failed to read save file {}", file.display()))
}

fn cmd_info(file: &Path, json: bool) -> Result<()> {
    let image = read_save(file)?;
    let metadata = Engine::query_save_metadata(&mut Cursor::new(&image))
        .with_context(|| format!("{} is not a readable save", file.display()))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&metadata)?);
    } else {
        report::print_metadata(&metadata, &image[..state::SAVE_MAGIC.len()]);
    }
    Ok(())
}

fn cmd_dump(file: &Path, game: &Path, platform: String, hex_dumps: bool) -> Result<()> {
    let image = read_save(file)?;
    let metadata = Engine::query_save_metadata(&mut Cursor::new(&image))
        .with_context(|| format!("{} is not a readable save", file.display()))?;
    let resources = DirectoryStorage::open(game)
        .with_context(|| format!("failed to open game data in {}", game.display()))?;
    debug!(root = %game.display(), "game data opened");

    let config = EngineConfig {
        interpreter_version: metadata.interpreter_version.to_string(),
        platform,
        ..EngineConfig::default()
    };
    let mut engine = Engine::new(Rc::new(resources), config).context("failed to start engine")?;
    engine
        .restore_game(&mut Cursor::new(&image))
        .context("restore failed")?;

    report::print_metadata(&metadata, &image[..state::SAVE_MAGIC.len()]);
    report::print_heap(&engine, hex_dumps);
    Ok(())
}

fn cmd_kernel(version: String, platform: String) -> Result<()> {
    let config = EngineConfig {
        interpreter_version: version,
        platform,
        ..EngineConfig::default()
    };
    let kernel = KernelDispatcher::new(config.version()?, config.platform()?)
        .context("kernel table is inconsistent for this build")?;
    report::print_kernel(&kernel);
    Ok(())
}
