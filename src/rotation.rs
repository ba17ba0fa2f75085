// ============================================================================
// Rotation State
// ============================================================================
// The pointer file holds the name of the wallpaper currently applied. Together
// with the ascending pool listing it decides what comes next.
// ============================================================================

use std::fs;
use std::io::ErrorKind;
#[cfg(test)]
use std::path::Path;
use std::path::PathBuf;

use crate::error::{Result, WallpoolError};
use crate::persist::write_atomic;
use crate::pool::StoredImage;

#[derive(Debug, Clone)]
pub struct RotationPointer {
    path: PathBuf,
}

impl RotationPointer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        RotationPointer { path: path.into() }
    }

    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name of the current wallpaper, or `None` if none was ever set.
    pub fn current(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let name = content.trim();
                Ok((!name.is_empty()).then(|| name.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(WallpoolError::Io(e)),
        }
    }

    pub fn set(&self, file_name: &str) -> Result<()> {
        write_atomic(&self.path, file_name.as_bytes())
            .map_err(|e| WallpoolError::persistence(&self.path, e))
    }
}

fn position_of(listing: &[StoredImage], current: Option<&str>) -> Option<usize> {
    let current = current?;
    listing.iter().position(|image| image.file_name == current)
}

/// Images strictly newer than the current pointer. With no pointer, or one
/// naming a file no longer in the pool, every image counts as unseen.
pub fn count_unseen(listing: &[StoredImage], current: Option<&str>) -> usize {
    match position_of(listing, current) {
        Some(pos) => listing.len() - pos - 1,
        None => listing.len(),
    }
}

/// The oldest image still newer than the pointer. Falls back to the oldest
/// image when the pointer is unset or dangling; `None` once the pointer is
/// at the newest image.
pub fn next_wallpaper<'a>(listing: &'a [StoredImage], current: Option<&str>) -> Option<&'a StoredImage> {
    match position_of(listing, current) {
        Some(pos) => listing.get(pos + 1),
        None => listing.first(),
    }
}
