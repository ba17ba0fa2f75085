// Command line interface module
// Flags layer over environment variables; paths left unset fall back to
// home-relative defaults in `config`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::driver::{DEFAULT_BATCH_SIZE, DEFAULT_THRESHOLD};
use crate::pexels::DEFAULT_ENDPOINT;

/// wallpool - rotate desktop wallpapers from a self-refilling Pexels pool
#[derive(Parser, Debug)]
#[command(name = "wallpool")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Pexels API key
    #[arg(long, env = "PEXELS_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Directory holding downloaded wallpapers
    #[arg(long, env = "WALLPOOL_PICTURES_DIR", global = true)]
    pub pictures_dir: Option<PathBuf>,

    /// Directory holding the hash ledger, rotation pointer and query list
    #[arg(long, env = "WALLPOOL_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Executable invoked with the path of each new wallpaper
    #[arg(long, env = "WALLPOOL_SWITCH_CMD", global = true)]
    pub switch_cmd: Option<PathBuf>,

    /// Images to fetch when the pool runs low
    #[arg(short, long, default_value_t = DEFAULT_BATCH_SIZE, value_parser = parse_batch_size, global = true)]
    pub batch_size: usize,

    /// Fetch when fewer than this many images are left unseen
    #[arg(short, long, default_value_t = DEFAULT_THRESHOLD, global = true)]
    pub threshold: usize,

    /// Search endpoint
    #[arg(long, default_value = DEFAULT_ENDPOINT, global = true)]
    pub endpoint: String,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Advance to the next wallpaper, fetching more if the pool is low (default)
    Rotate {
        /// Report the decision without fetching or changing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Show pool size, unseen count and the current wallpaper
    Status,
}

impl Default for Command {
    fn default() -> Self {
        Command::Rotate { dry_run: false }
    }
}

/// Batch size must be at least one: the primary fetch.
fn parse_batch_size(s: &str) -> Result<usize, String> {
    let n: usize = s.parse().map_err(|_| "Invalid batch size")?;
    if n == 0 {
        return Err("Batch size must be at least 1".to_string());
    }
    Ok(n)
}
