// ============================================================================
// Rotation Driver
// ============================================================================
// Decides afresh on every run, from the pool listing and the pointer alone:
// top up the pool when fewer than `threshold` images are left unseen,
// otherwise advance to the next stored image without touching the network.
// ============================================================================

use log::info;

use crate::error::Result;
use crate::fetch::BatchReport;
use crate::pool::{ImagePool, StoredImage};
use crate::rotation::{count_unseen, next_wallpaper, RotationPointer};
use crate::setter::WallpaperSetter;

pub const DEFAULT_THRESHOLD: usize = 2;
pub const DEFAULT_BATCH_SIZE: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    NeedsFetch { unseen: usize },
    HasBacklog { unseen: usize, next: Option<StoredImage> },
}

pub fn decide(listing: &[StoredImage], current: Option<&str>, threshold: usize) -> Decision {
    let unseen = count_unseen(listing, current);
    if unseen < threshold {
        Decision::NeedsFetch { unseen }
    } else {
        Decision::HasBacklog {
            unseen,
            next: next_wallpaper(listing, current).cloned(),
        }
    }
}

#[derive(Debug)]
pub enum Outcome {
    Fetched(BatchReport),
    Rotated(StoredImage),
    NothingToRotate,
}

pub struct RotationDriver<'a> {
    pub pool: &'a ImagePool,
    pub pointer: &'a RotationPointer,
    pub setter: &'a dyn WallpaperSetter,
    pub threshold: usize,
    pub batch_size: usize,
}

impl RotationDriver<'_> {
    pub fn plan(&self) -> Result<Decision> {
        let listing = self.pool.listing()?;
        let current = self.pointer.current()?;
        Ok(decide(&listing, current.as_deref(), self.threshold))
    }

    /// Carry out this run's decision. `fetch` is only called on the fetch
    /// path, with the configured batch size.
    pub fn run<F>(&self, fetch: F) -> Result<Outcome>
    where
        F: FnOnce(usize) -> Result<BatchReport>,
    {
        match self.plan()? {
            Decision::NeedsFetch { unseen } => {
                info!(
                    "Insufficient images in directory ({} unseen), fetching {} more...",
                    unseen, self.batch_size
                );
                fetch(self.batch_size).map(Outcome::Fetched)
            }
            Decision::HasBacklog { unseen, next: Some(next) } => {
                info!(
                    "Sufficient images in directory ({} unseen), skipping fetch",
                    unseen
                );
                info!("Setting wallpaper: {}", next.file_name);
                self.setter.apply(&self.pool.path_of(&next.file_name));
                self.pointer.set(&next.file_name)?;
                Ok(Outcome::Rotated(next))
            }
            Decision::HasBacklog { next: None, .. } => {
                info!("Nothing to rotate to");
                Ok(Outcome::NothingToRotate)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::error::WallpoolError;
    use crate::fetch::testing::{StubMode, StubSource};
    use crate::fetch::{fetch_batch, Fetcher};
    use crate::ledger::HashLedger;
    use crate::queries::QueryTerms;
    use crate::setter::testing::RecordingSetter;

    const THREE: [&str; 3] = [
        "20240101000000-0.jpg",
        "20240102000000-0.jpg",
        "20240103000000-0.jpg",
    ];

    struct Fixture {
        temp_dir: TempDir,
        pool: ImagePool,
        pointer: RotationPointer,
        setter: RecordingSetter,
    }

    impl Fixture {
        fn with_images(names: &[&str]) -> Self {
            let temp_dir = TempDir::new().unwrap();
            let pool = ImagePool::new(temp_dir.path().join("Pexels"));
            pool.ensure_dir().unwrap();
            for name in names {
                fs::write(pool.path_of(name), name.as_bytes()).unwrap();
            }
            Fixture {
                pointer: RotationPointer::new(temp_dir.path().join("latest_wallpaper.txt")),
                setter: RecordingSetter::default(),
                pool,
                temp_dir,
            }
        }

        fn driver(&self, threshold: usize) -> RotationDriver<'_> {
            RotationDriver {
                pool: &self.pool,
                pointer: &self.pointer,
                setter: &self.setter,
                threshold,
                batch_size: 5,
            }
        }
    }

    fn images(names: &[&str]) -> Vec<StoredImage> {
        names
            .iter()
            .map(|n| StoredImage::from_file_name(n).unwrap())
            .collect()
    }

    #[test]
    fn test_one_unseen_below_threshold_fetches() {
        let listing = images(&THREE);
        assert_eq!(
            decide(&listing, Some("20240102000000-0.jpg"), 2),
            Decision::NeedsFetch { unseen: 1 }
        );
    }

    #[test]
    fn test_backlog_picks_next_image() {
        let listing = images(&THREE);
        assert_eq!(
            decide(&listing, Some("20240101000000-0.jpg"), 2),
            Decision::HasBacklog {
                unseen: 2,
                next: StoredImage::from_file_name("20240102000000-0.jpg"),
            }
        );
    }

    #[test]
    fn test_empty_pool_fetches() {
        assert_eq!(decide(&[], None, DEFAULT_THRESHOLD), Decision::NeedsFetch { unseen: 0 });
    }

    #[test]
    fn test_run_needs_fetch_invokes_orchestrator() {
        let fx = Fixture::with_images(&THREE);
        fx.pointer.set("20240102000000-0.jpg").unwrap();
        let called_with = Cell::new(None);

        let outcome = fx
            .driver(2)
            .run(|size| {
                called_with.set(Some(size));
                Ok(BatchReport::default())
            })
            .unwrap();

        assert!(matches!(outcome, Outcome::Fetched(_)));
        assert_eq!(called_with.get(), Some(5));
        assert!(fx.setter.applied().is_empty());
        assert_eq!(
            fx.pointer.current().unwrap().as_deref(),
            Some("20240102000000-0.jpg")
        );
    }

    #[test]
    fn test_run_backlog_rotates_without_fetch() {
        let fx = Fixture::with_images(&THREE);
        fx.pointer.set("20240101000000-0.jpg").unwrap();

        let outcome = fx
            .driver(2)
            .run(|_| panic!("backlog must not fetch"))
            .unwrap();

        match outcome {
            Outcome::Rotated(image) => assert_eq!(image.file_name, "20240102000000-0.jpg"),
            other => panic!("expected rotation, got {:?}", other),
        }
        assert_eq!(
            fx.pointer.current().unwrap().as_deref(),
            Some("20240102000000-0.jpg")
        );
        assert_eq!(
            fx.setter.applied(),
            vec![fx.pool.path_of("20240102000000-0.jpg")]
        );
    }

    #[test]
    fn test_successive_runs_walk_forward_then_fetch() {
        let fx = Fixture::with_images(&[
            "20240101000000-0.jpg",
            "20240101000000-1.jpg",
            "20240101000000-2.jpg",
            "20240101000000-3.jpg",
        ]);
        fx.pointer.set("20240101000000-0.jpg").unwrap();
        let driver = fx.driver(2);

        assert!(matches!(driver.run(|_| unreachable!()).unwrap(), Outcome::Rotated(_)));
        assert!(matches!(driver.run(|_| unreachable!()).unwrap(), Outcome::Rotated(_)));
        assert_eq!(
            fx.pointer.current().unwrap().as_deref(),
            Some("20240101000000-2.jpg")
        );

        let fetched = Cell::new(false);
        driver
            .run(|_| {
                fetched.set(true);
                Ok(BatchReport::default())
            })
            .unwrap();
        assert!(fetched.get());
    }

    #[test]
    fn test_zero_threshold_at_newest_is_noop() {
        let fx = Fixture::with_images(&THREE);
        fx.pointer.set("20240103000000-0.jpg").unwrap();

        let outcome = fx.driver(0).run(|_| unreachable!()).unwrap();

        assert!(matches!(outcome, Outcome::NothingToRotate));
        assert!(fx.setter.applied().is_empty());
    }

    #[test]
    fn test_missing_pool_dir_propagates() {
        let fx = Fixture::with_images(&[]);
        fs::remove_dir_all(fx.pool.dir()).unwrap();
        let err = fx.driver(2).run(|_| Ok(BatchReport::default())).unwrap_err();
        assert!(matches!(err, WallpoolError::Io(_)));
    }

    #[test]
    fn test_fetch_path_end_to_end_with_stub() {
        let fx = Fixture::with_images(&[]);
        let ledger = HashLedger::load(&fx.temp_dir.path().join("pexels_hashes.json")).unwrap();
        let queries = QueryTerms::new(vec!["desert".into()]).unwrap();
        let source = StubSource::new(StubMode::Distinct);

        let outcome = fx
            .driver(2)
            .run(|size| {
                let fetcher = Fetcher {
                    source: &source,
                    queries: &queries,
                    ledger: &ledger,
                    pool: &fx.pool,
                    pointer: &fx.pointer,
                    setter: &fx.setter,
                };
                fetch_batch(&fetcher, size)
            })
            .unwrap();

        let report = match outcome {
            Outcome::Fetched(report) => report,
            other => panic!("expected fetch, got {:?}", other),
        };
        assert_eq!(report.stored.len(), 5);
        let primary = report.primary.unwrap();
        assert_eq!(fx.pointer.current().unwrap(), Some(primary.file_name.clone()));

        // Four newer images are now waiting, so the next run rotates.
        assert_eq!(
            count_unseen(&fx.pool.listing().unwrap(), Some(&primary.file_name)),
            4
        );
        assert!(matches!(fx.driver(2).plan().unwrap(), Decision::HasBacklog { .. }));
    }
}
