// ============================================================================
// Configuration
// ============================================================================

use std::path::{Path, PathBuf};

use crate::cli::Args;
use crate::error::{Result, WallpoolError};

const PICTURES_SUBDIR: &str = "Pictures/Wallpapers/Pexels";
const DATA_SUBDIR: &str = ".local/bin/data";
const SWITCH_CMD: &str = ".config/eww/scripts/switchwall";

const HASHES_FILE: &str = "pexels_hashes.json";
const POINTER_FILE: &str = "latest_wallpaper.txt";
const QUERIES_FILE: &str = "pexels.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_key: Option<String>,
    pub pictures_dir: PathBuf,
    pub hashes_file: PathBuf,
    pub pointer_file: PathBuf,
    pub queries_file: PathBuf,
    pub switch_cmd: PathBuf,
    pub batch_size: usize,
    pub threshold: usize,
    pub endpoint: String,
}

impl Config {
    pub fn from_args(args: &Args) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        Config::resolve(args, dirs::home_dir(), &cwd)
    }

    /// Explicit flags win; anything left unset lives under `home`.
    pub fn resolve(args: &Args, home: Option<PathBuf>, cwd: &Path) -> Result<Self> {
        let under_home = |explicit: &Option<PathBuf>, rel: &str| -> Result<PathBuf> {
            match explicit {
                Some(path) => Ok(absolute(cwd, path)),
                None => home
                    .as_ref()
                    .map(|h| h.join(rel))
                    .ok_or_else(|| WallpoolError::Config(format!(
                        "cannot locate home directory for default {}",
                        rel
                    ))),
            }
        };

        let pictures_dir = under_home(&args.pictures_dir, PICTURES_SUBDIR)?;
        let data_dir = under_home(&args.data_dir, DATA_SUBDIR)?;
        let switch_cmd = under_home(&args.switch_cmd, SWITCH_CMD)?;

        Ok(Config {
            api_key: args
                .api_key
                .as_ref()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            pictures_dir,
            hashes_file: data_dir.join(HASHES_FILE),
            pointer_file: data_dir.join(POINTER_FILE),
            queries_file: data_dir.join(QUERIES_FILE),
            switch_cmd,
            batch_size: args.batch_size,
            threshold: args.threshold,
            endpoint: args.endpoint.clone(),
        })
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| WallpoolError::Config("PEXELS_API_KEY environment variable not set".into()))
    }
}

fn absolute(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}
