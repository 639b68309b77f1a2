//! fwxml CLI
//!
//! Developer tool for compiling fixed-width-to-XML templates and expanding
//! positional data files locally.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

/// fwxml - fixed-width to XML template compiler
#[derive(Parser)]
#[command(name = "fwxml")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "fwxml.yaml", env = "FWXML_CONFIG")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new fwxml project
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,

        /// Project name (defaults to directory name)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Parse and build every template without writing anything
    Validate,

    /// Compile templates
    Compile {
        /// Compile a specific template only
        #[arg(short, long)]
        template: Option<String>,

        /// Write a precompiled Rust module per template
        #[arg(long)]
        emit_rust: bool,

        /// Regenerate Rust modules even when a cached copy exists
        #[arg(long)]
        force: bool,

        /// Print a JSON summary to stdout
        #[arg(long)]
        json: bool,
    },

    /// Expand a positional data file into XML
    Expand {
        /// Template name
        template: String,

        /// Positional input file
        input: PathBuf,

        /// Produce UTF-8 bytes directly instead of UTF-16
        #[arg(long)]
        bytes: bool,

        /// Output buffer size (overrides the project setting)
        #[arg(long)]
        capacity: Option<usize>,

        /// Write XML to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    // stdout carries command output, so logs go to stderr
    let registry = tracing_subscriber::registry().with(filter);
    if cli.log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    match cli.command {
        Commands::Init { path, name } => {
            commands::init::run(&path, name.as_deref()).await?;
        }
        Commands::Validate => {
            commands::validate::run(&cli.config).await?;
        }
        Commands::Compile {
            template,
            emit_rust,
            force,
            json,
        } => {
            commands::compile::run(&cli.config, template.as_deref(), emit_rust, force, json)
                .await?;
        }
        Commands::Expand {
            template,
            input,
            bytes,
            capacity,
            output,
        } => {
            let args = commands::expand::ExpandArgs {
                template,
                input,
                bytes,
                capacity,
                output,
            };
            commands::expand::run(&cli.config, args).await?;
        }
    }

    Ok(())
}
