// ============================================================================
// Image Pool
// ============================================================================
// Flat directory of downloaded wallpapers named `<YYYYMMDDHHMMSS>-<index>.jpg`.
// The name is the identity and, thanks to the fixed-width timestamp, also
// the chronological order: images sort by plain byte order of the name.
// ============================================================================

use std::cmp::Ordering;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime, Timelike};

pub const IMAGE_EXTENSION: &str = "jpg";
const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";
const TIMESTAMP_LEN: usize = 14;

/// Acquisition time and worker index embedded in a pool filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageKey {
    pub taken_at: NaiveDateTime,
    pub index: usize,
}

impl ImageKey {
    pub fn new(taken_at: NaiveDateTime, index: usize) -> Self {
        // Filenames only carry whole seconds.
        let taken_at = taken_at.with_nanosecond(0).unwrap_or(taken_at);
        ImageKey { taken_at, index }
    }

    pub fn now(index: usize) -> Self {
        ImageKey::new(Local::now().naive_local(), index)
    }

    pub fn parse(file_name: &str) -> Option<Self> {
        let stem = file_name.strip_suffix(&format!(".{}", IMAGE_EXTENSION))?;
        let (stamp, index) = stem.split_once('-')?;
        if stamp.len() != TIMESTAMP_LEN || !stamp.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let taken_at = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()?;
        Some(ImageKey {
            taken_at,
            index: index.parse().ok()?,
        })
    }

    pub fn file_name(&self) -> String {
        format!(
            "{}-{}.{}",
            self.taken_at.format(TIMESTAMP_FORMAT),
            self.index,
            IMAGE_EXTENSION
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub key: ImageKey,
    pub file_name: String,
}

impl StoredImage {
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        ImageKey::parse(file_name).map(|key| StoredImage {
            key,
            file_name: file_name.to_string(),
        })
    }
}

// Lexical on the name, so `-10` sorts before `-2` within one second.
impl Ord for StoredImage {
    fn cmp(&self, other: &Self) -> Ordering {
        self.file_name.cmp(&other.file_name)
    }
}

impl PartialOrd for StoredImage {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone)]
pub struct ImagePool {
    dir: PathBuf,
}

impl ImagePool {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        ImagePool { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ensure_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)
    }

    pub fn path_of(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    /// Pool images in ascending chronological order. Anything that does not
    /// follow the naming scheme is skipped.
    pub fn listing(&self) -> std::io::Result<Vec<StoredImage>> {
        let mut images: Vec<StoredImage> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| entry.file_name().to_str().and_then(StoredImage::from_file_name))
            .collect();
        images.sort();
        Ok(images)
    }

    /// Write a freshly downloaded image. Never overwrites an existing file.
    pub fn store(&self, key: ImageKey, bytes: &[u8]) -> std::io::Result<StoredImage> {
        let file_name = key.file_name();
        let path = self.path_of(&file_name);

        let mut file = OpenOptions::new().write(true).create_new(true).open(&path)?;
        if let Err(e) = file.write_all(bytes) {
            drop(file);
            let _ = fs::remove_file(&path);
            return Err(e);
        }

        Ok(StoredImage { key, file_name })
    }
}
