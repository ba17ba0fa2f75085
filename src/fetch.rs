// ============================================================================
// Fetch Pipeline
// ============================================================================
// One worker per image: random query, one search, one download, dedup,
// store. Worker 0 (the primary) also applies the image and moves the
// rotation pointer. The primary runs alone first so a wallpaper is on
// screen before the rest of the batch fans out.
// ============================================================================

use std::io;
use std::thread;

use log::{error, info, warn};
use rand::Rng;

use crate::error::{Result, WallpoolError};
use crate::ledger::HashLedger;
use crate::pexels::{PhotoSource, MAX_PAGE};
use crate::pool::{ImageKey, ImagePool, StoredImage};
use crate::queries::QueryTerms;
use crate::rotation::RotationPointer;
use crate::setter::WallpaperSetter;

pub const PRIMARY_INDEX: usize = 0;

/// Everything a worker touches. Shared by reference across the batch.
pub struct Fetcher<'a> {
    pub source: &'a dyn PhotoSource,
    pub queries: &'a QueryTerms,
    pub ledger: &'a HashLedger,
    pub pool: &'a ImagePool,
    pub pointer: &'a RotationPointer,
    pub setter: &'a dyn WallpaperSetter,
}

impl Fetcher<'_> {
    pub fn fetch(&self, index: usize) -> Result<StoredImage> {
        let query = self.queries.pick()?;
        let page = rand::thread_rng().gen_range(1..=MAX_PAGE);
        info!("[{}] Searching '{}' (page {})", index, query, page);

        let url = self
            .source
            .search(query, page)?
            .ok_or_else(|| WallpoolError::NoResult {
                query: query.to_string(),
            })?;

        info!("[{}] Downloading image: {}", index, url);
        let bytes = self.source.download(&url)?;
        let hash = self.ledger.claim(&bytes)?;

        let stored = match self.pool.store(ImageKey::now(index), &bytes) {
            Ok(stored) => stored,
            Err(e) => {
                self.ledger.release(&hash);
                return Err(e.into());
            }
        };

        if index == PRIMARY_INDEX {
            self.setter.apply(&self.pool.path_of(&stored.file_name));
            self.pointer.set(&stored.file_name)?;
        }

        Ok(stored)
    }
}

/// Per-batch tally. Failures are counted, never raised.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub stored: Vec<StoredImage>,
    pub primary: Option<StoredImage>,
    pub duplicates: usize,
    pub empty: usize,
    pub failed: usize,
}

impl BatchReport {
    fn record(&mut self, index: usize, outcome: Result<StoredImage>) {
        match outcome {
            Ok(image) => {
                info!("✓ [{}] Stored {}", index, image.file_name);
                if index == PRIMARY_INDEX {
                    self.primary = Some(image.clone());
                }
                self.stored.push(image);
            }
            Err(e) if e.is_expected() => {
                info!("[{}] Skipped: {}", index, e);
                if matches!(e, WallpoolError::Duplicate { .. }) {
                    self.duplicates += 1;
                } else {
                    self.empty += 1;
                }
            }
            Err(e @ WallpoolError::Network(_)) => {
                warn!("[{}] Failed: {}", index, e);
                self.failed += 1;
            }
            Err(e) => {
                error!("[{}] Failed: {}", index, e);
                self.failed += 1;
            }
        }
    }
}

/// Run worker 0 to completion, then workers `1..size` in parallel, and wait
/// for all of them. Only a configuration failure on the primary aborts the
/// batch, since no sibling could succeed either.
pub fn fetch_batch(fetcher: &Fetcher<'_>, size: usize) -> Result<BatchReport> {
    let mut report = BatchReport::default();
    if size == 0 {
        return Ok(report);
    }

    match fetcher.fetch(PRIMARY_INDEX) {
        Err(e) if e.is_fatal() => {
            error!("[{}] Failed: {}", PRIMARY_INDEX, e);
            return Err(e);
        }
        outcome => report.record(PRIMARY_INDEX, outcome),
    }

    let outcomes: Vec<(usize, Result<StoredImage>)> = thread::scope(|s| {
        let handles: Vec<_> = (1..size)
            .map(|index| (index, s.spawn(move || fetcher.fetch(index))))
            .collect();

        handles
            .into_iter()
            .map(|(index, handle)| {
                let outcome = handle.join().unwrap_or_else(|_| {
                    Err(WallpoolError::Io(io::Error::new(
                        io::ErrorKind::Other,
                        "fetch worker panicked",
                    )))
                });
                (index, outcome)
            })
            .collect()
    });

    for (index, outcome) in outcomes {
        report.record(index, outcome);
    }

    info!(
        "Batch done: {} stored, {} duplicate, {} empty, {} failed",
        report.stored.len(),
        report.duplicates,
        report.empty,
        report.failed
    );
    Ok(report)
}

#[cfg(test)]
pub mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// What the stub search service hands out.
    pub enum StubMode {
        /// Every search hits a fresh photo with unique bytes.
        Distinct,
        /// Every search hits a photo with the same bytes.
        Same(Vec<u8>),
        NoResults,
        Unauthorized,
        Offline,
    }

    pub struct StubSource {
        mode: StubMode,
        pub searches: AtomicUsize,
        pub queries: Mutex<Vec<(String, u32)>>,
    }

    impl StubSource {
        pub fn new(mode: StubMode) -> Self {
            StubSource {
                mode,
                searches: AtomicUsize::new(0),
                queries: Mutex::new(Vec::new()),
            }
        }

        pub fn search_count(&self) -> usize {
            self.searches.load(Ordering::SeqCst)
        }
    }

    impl PhotoSource for StubSource {
        fn search(&self, query: &str, page: u32) -> Result<Option<String>> {
            let n = self.searches.fetch_add(1, Ordering::SeqCst);
            self.queries.lock().unwrap().push((query.to_string(), page));
            match self.mode {
                StubMode::Distinct | StubMode::Same(_) => Ok(Some(format!("stub://photo/{}", n))),
                StubMode::NoResults => Ok(None),
                StubMode::Unauthorized => Err(WallpoolError::Config("invalid Pexels API key".into())),
                StubMode::Offline => Err(WallpoolError::Network("connection refused".into())),
            }
        }

        fn download(&self, url: &str) -> Result<Vec<u8>> {
            match &self.mode {
                StubMode::Same(bytes) => Ok(bytes.clone()),
                _ => Ok(format!("jpeg bytes of {}", url).into_bytes()),
            }
        }
    }
}
