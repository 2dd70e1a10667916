//! braid CLI - offline tools for braid binary logs.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// braid - structured binary log tooling.
#[derive(Parser)]
#[command(name = "braid")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a binary log as per-stream text files
    Format {
        /// Path to the .log file (the .fmt sibling is read automatically)
        log: PathBuf,

        /// Directory for the text files (defaults to the log's directory)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Indentation width per region depth
        #[arg(long, default_value = "2")]
        indent: usize,
    },

    /// Emit the reconstructed node tree as a DOT digraph
    Graph {
        /// Path to the .log file
        log: PathBuf,

        /// Output path (defaults to the log path with .dot appended)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print node statistics of a binary log
    Stat {
        /// Path to the .log file
        log: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match cli.command {
        Commands::Format {
            log,
            out_dir,
            indent,
        } => commands::format::run(&log, out_dir.as_deref(), indent),
        Commands::Graph { log, output } => commands::graph::run(&log, output),
        Commands::Stat { log } => commands::stat::run(&log),
    }
}
