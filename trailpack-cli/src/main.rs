//! trailpack CLI
//!
//! Encodes event corpora into the compact trail representation and
//! inspects encoded output directories.

mod commands;
mod utils;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use commands::{cmd_encode, cmd_info};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "trailpack")]
#[command(author, version, about = "Compact on-disk event trails")]
#[command(long_about = "
trailpack encodes time-ordered event trails into a compact immutable
on-disk form: per-actor sequences are delta-encoded, reduced to changed
field values and entropy-coded with a corpus-wide Huffman codebook.

Examples:
  trailpack encode events.json -o out/
  trailpack info out/
  trailpack info out/ --json
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a JSON event corpus into a trail directory
    #[command(alias = "e")]
    Encode {
        /// Input JSON file ({"fields": [...], "events": [...]})
        input: PathBuf,

        /// Output directory for info, trails.data and trails.codebook
        #[arg(short, long)]
        output: PathBuf,

        /// Show progress bar
        #[arg(short = 'P', long, default_value = "true")]
        progress: bool,
    },

    /// Show information about an encoded trail directory
    #[command(alias = "i")]
    Info {
        /// Directory holding the encoded output
        root: PathBuf,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,
    },

    /// Generate shell completion scripts
    #[command(hide = true)]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Encode {
            input,
            output,
            progress,
        } => cmd_encode(&input, &output, progress),
        Commands::Info { root, json } => cmd_info(&root, json),
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "trailpack", &mut io::stdout());
            return;
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
