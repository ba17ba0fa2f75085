// ============================================================================
// Wallpaper Setting
// ============================================================================
// The desktop side is an opaque executable taking the image path. Its output
// and exit status are not inspected.
// ============================================================================

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

use log::{debug, warn};

pub trait WallpaperSetter: Sync {
    fn apply(&self, image_path: &Path);
}

pub struct CommandSetter {
    program: PathBuf,
}

impl CommandSetter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        CommandSetter {
            program: program.into(),
        }
    }
}

impl WallpaperSetter for CommandSetter {
    fn apply(&self, image_path: &Path) {
        let start = Instant::now();
        match Command::new(&self.program)
            .arg(image_path)
            .stdin(Stdio::null())
            .status()
        {
            Ok(status) => debug!(
                "{} exited with {} after {:?}",
                self.program.display(),
                status,
                start.elapsed()
            ),
            Err(e) => warn!("Could not run {}: {}", self.program.display(), e),
        }
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Records every path it was asked to apply.
    #[derive(Default)]
    pub struct RecordingSetter {
        pub applied: Mutex<Vec<PathBuf>>,
    }

    impl WallpaperSetter for RecordingSetter {
        fn apply(&self, image_path: &Path) {
            self.applied.lock().unwrap().push(image_path.to_path_buf());
        }
    }

    impl RecordingSetter {
        pub fn applied(&self) -> Vec<PathBuf> {
            self.applied.lock().unwrap().clone()
        }
    }
}
