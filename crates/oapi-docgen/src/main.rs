use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clap_complete::Shell;

use oapi_docgen::{DocgenOptions, OUTPUT_FILE_NAME, generate};

#[derive(Parser)]
#[command(
    name = "oapi-docgen",
    about = "Generate OpenAPI property docs from struct doc comments",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate `openapi_docs.rs` for a directory of Rust sources
    Generate {
        /// Directory to scan. Defaults to the current working directory
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Attribute consulted for renamed and skipped fields
        #[arg(long, default_value = "serde")]
        tag: String,

        /// Document every struct, not only those marked `openapi:gen`
        #[arg(long)]
        all: bool,

        /// Suppress generation output
        #[arg(short, long)]
        quiet: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            path,
            tag,
            all,
            quiet,
        } => cmd_generate(path, DocgenOptions { tag, all }, quiet),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "oapi-docgen", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn cmd_generate(path: Option<PathBuf>, options: DocgenOptions, quiet: bool) -> Result<()> {
    let dir = match path {
        Some(path) => path,
        None => env::current_dir().context("could not determine current working directory")?,
    };
    let output = dir.join(OUTPUT_FILE_NAME);

    if !quiet {
        eprintln!("Generating docs for {}", dir.display());
    }

    if output.exists() {
        fs::remove_file(&output)
            .with_context(|| format!("failed to remove stale {}", output.display()))?;
    }

    let Some(content) = generate(&dir, &options)
        .with_context(|| format!("could not generate documentation file {}", output.display()))?
    else {
        if !quiet {
            eprintln!("  nothing to document");
        }
        return Ok(());
    };

    fs::write(&output, content).with_context(|| format!("failed to write {}", output.display()))?;
    if !quiet {
        eprintln!("  wrote {}", output.display());
    }
    Ok(())
}
