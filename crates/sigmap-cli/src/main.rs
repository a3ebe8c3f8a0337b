use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{ModuleDump, NamedPointer};

#[derive(Parser)]
#[command(name = "sigmap")]
#[command(about = "Inspect game configurations and resolve address descriptors offline")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search a module dump for a byte pattern
    Scan {
        /// Raw image dump
        file: PathBuf,

        /// Byte pattern, e.g. "55 8B EC ?? ?? 6A 02"
        #[arg(short, long)]
        pattern: String,

        /// Load address of the dump (hex)
        #[arg(short, long, default_value = "0x10000000")]
        base: String,

        /// Maximum number of matches to print
        #[arg(short, long, default_value_t = 16)]
        limit: usize,
    },

    /// Show a game configuration with its Inherit chain resolved
    Config {
        /// Configuration document (GameConfig.json)
        path: PathBuf,

        /// Game title; lists every title when omitted
        #[arg(short, long)]
        game: Option<String>,

        /// Print the resolved properties as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve every address descriptor of a game against module dumps
    Resolve {
        /// Configuration document (GameConfig.json)
        path: PathBuf,

        /// Game title
        #[arg(short, long)]
        game: String,

        /// Module dump as NAME=FILE@BASE, e.g. engine.dll=engine.bin@0x10000000
        #[arg(short, long = "module")]
        modules: Vec<ModuleDump>,

        /// Registry pointer as NAME=ADDRESS, for VTPtrName descriptors
        #[arg(long = "pointer")]
        pointers: Vec<NamedPointer>,

        /// Pointer width of the dumped process in bytes
        #[arg(long, default_value_t = 4)]
        pointer_size: usize,
    },

    /// Calculate the offset between two addresses
    Offset {
        /// Start address (hex)
        from: String,

        /// End address (hex)
        to: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("sigmap=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    debug!(
        "sigmap {} (library version {})",
        env!("CARGO_PKG_VERSION"),
        sigmap::library_version()
    );

    match args.command {
        Command::Scan {
            file,
            pattern,
            base,
            limit,
        } => commands::scan::run(&file, &pattern, &base, limit),
        Command::Config { path, game, json } => commands::config::run(&path, game.as_deref(), json),
        Command::Resolve {
            path,
            game,
            modules,
            pointers,
            pointer_size,
        } => commands::resolve::run(&path, &game, &modules, &pointers, pointer_size),
        Command::Offset { from, to } => commands::offset::run(&from, &to),
    }
}
