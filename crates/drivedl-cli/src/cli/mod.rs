//! CLI for drivedl.

mod commands;

use anyhow::Result;
use clap::Parser;
use drivedl_core::config;
use std::path::PathBuf;

use commands::run_download;

/// Download a file from a Google Drive shareable link.
#[derive(Debug, Parser)]
#[command(name = "drivedl", version)]
#[command(about = "Download a file from a Google Drive shareable link", long_about = None)]
pub struct Cli {
    /// Shareable link, e.g. https://drive.google.com/file/d/<ID>/view?usp=sharing
    pub link: String,

    /// Where to save the file. An existing directory keeps the original filename;
    /// a bare filename means the current directory, named after the server
    /// filename when one is sent; anything else is used as the full output
    /// path. Defaults to the current directory.
    pub destination: Option<PathBuf>,

    /// Read configuration from this file instead of ~/.config/drivedl/config.toml.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = match &cli.config {
            Some(path) => config::load_from(path)?,
            None => config::load()?,
        };
        tracing::debug!("loaded config: {:?}", cfg);

        run_download(&cli.link, cli.destination.as_deref(), &cfg).await
    }
}
