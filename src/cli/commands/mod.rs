//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod cache;
mod download;
mod scrape;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings, LoadOptions};

#[derive(Parser)]
#[command(name = "albumgrab")]
#[command(about = "Browser-driven gallery scraper with an album cache and HTTP API")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Data directory (cache and downloads live below it)
    #[arg(long, global = true, env = "ALBUMGRAB_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Bind address: port, host, or host:port (default from config)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Look up an album, scraping it unless cached
    Scrape {
        /// Model name to search for
        model: String,
        /// 1-based gallery index on the search page
        #[arg(default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
        index: u32,
        /// Ignore the cache and scrape again
        #[arg(short, long)]
        refresh: bool,
        /// Print the album as JSON
        #[arg(long)]
        json: bool,
    },

    /// Download every image of an album (scrapes first if not cached)
    Download {
        /// Model name
        model: String,
        /// 1-based gallery index
        #[arg(default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
        index: u32,
    },

    /// Inspect and clear the album cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}

#[derive(Subcommand)]
enum CacheCommands {
    /// List cached albums
    List,
    /// Remove one cached album
    Remove {
        model: String,
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        index: u32,
    },
    /// Remove every cached album of a model
    Clear { model: String },
}

/// Parse arguments, load settings and run the selected command.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        data_dir: cli.data_dir,
    };
    let settings = load_settings(options).await?;

    match cli.command {
        Commands::Serve { bind } => serve::cmd_serve(&settings, bind.as_deref()).await,
        Commands::Scrape {
            model,
            index,
            refresh,
            json,
        } => scrape::cmd_scrape(&settings, &model, index, refresh, json).await,
        Commands::Download { model, index } => {
            download::cmd_download(&settings, &model, index).await
        }
        Commands::Cache { command } => match command {
            CacheCommands::List => cache::cmd_cache_list(&settings).await,
            CacheCommands::Remove { model, index } => {
                cache::cmd_cache_remove(&settings, &model, index).await
            }
            CacheCommands::Clear { model } => cache::cmd_cache_clear(&settings, &model).await,
        },
    }
}
