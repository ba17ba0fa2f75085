// ============================================================================
// Hash Ledger
// ============================================================================
// Persistent set of SHA-256 digests of every image ever downloaded. Workers
// share one ledger by reference; check-and-record is serialized by the lock.
// ============================================================================

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use log::debug;
use sha2::{Digest, Sha256};

use crate::error::{Result, WallpoolError};
use crate::persist::write_atomic;

/// Lowercase hex SHA-256 of the raw image bytes.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[derive(Debug)]
pub struct HashLedger {
    path: PathBuf,
    hashes: Mutex<HashSet<String>>,
}

impl HashLedger {
    /// Read the ledger at `path`. A missing file is an empty ledger.
    pub fn load(path: &Path) -> Result<Self> {
        let hashes = if path.exists() {
            let content = fs::read_to_string(path)
                .map_err(|e| WallpoolError::persistence(path, e))?;
            let list: Vec<String> = serde_json::from_str(&content)
                .map_err(|e| WallpoolError::persistence(path, e))?;
            list.into_iter().collect()
        } else {
            HashSet::new()
        };

        debug!("Loaded {} image hashes from {}", hashes.len(), path.display());
        Ok(HashLedger {
            path: path.to_path_buf(),
            hashes: Mutex::new(hashes),
        })
    }

    /// Write the full set back, replacing whatever was stored before.
    pub fn save(&self) -> Result<()> {
        let list: Vec<String> = self.lock().iter().cloned().collect();
        let json = serde_json::to_vec(&list)
            .map_err(|e| WallpoolError::persistence(&self.path, e))?;
        write_atomic(&self.path, &json).map_err(|e| WallpoolError::persistence(&self.path, e))?;
        debug!("Saved {} image hashes to {}", list.len(), self.path.display());
        Ok(())
    }

    #[cfg(test)]
    pub fn contains(&self, hash: &str) -> bool {
        self.lock().contains(hash)
    }

    /// Idempotent insert.
    #[cfg(test)]
    pub fn record(&self, hash: &str) {
        self.lock().insert(hash.to_string());
    }

    /// Atomically claim `hash`. Returns false if it was already present, in
    /// which case the caller holds a duplicate.
    pub fn check_and_record(&self, hash: &str) -> bool {
        self.lock().insert(hash.to_string())
    }

    /// Give back a claim whose image never made it to disk.
    pub fn release(&self, hash: &str) {
        self.lock().remove(hash);
    }

    /// Hash `bytes` and claim it, failing with `Duplicate` if already seen.
    pub fn claim(&self, bytes: &[u8]) -> Result<String> {
        let hash = content_hash(bytes);
        if self.check_and_record(&hash) {
            Ok(hash)
        } else {
            Err(WallpoolError::Duplicate { hash })
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> HashSet<String> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        // A panicked worker cannot leave the set half-updated.
        self.hashes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
