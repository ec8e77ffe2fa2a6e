//! Scratch-file lifecycle
//!
//! Every pipeline job gets its own janitor owning a private scratch
//! directory. Stages allocate scratch paths through it; on the job's
//! terminal transition the janitor releases everything it handed out,
//! exactly once, in reverse order of allocation. Individual release
//! failures are logged and never raised.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::core::CleanupError;

/// Owns the scratch artifacts of one pipeline job
pub struct TempResourceJanitor {
    /// Per-job scratch directory
    root: PathBuf,
    /// Allocation-ordered handles
    handles: Mutex<Vec<PathBuf>>,
    /// Set once release has run
    released: AtomicBool,
}

impl TempResourceJanitor {
    /// Create a janitor with a fresh scratch directory under `scratch_root`
    pub fn new(scratch_root: &Path, job_id: &str) -> std::io::Result<Self> {
        let root = scratch_root.join(job_id);
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            handles: Mutex::new(Vec::new()),
            released: AtomicBool::new(false),
        })
    }

    /// Allocate (and register) a new scratch path with the given extension.
    ///
    /// The file is not created; the stage producing the artifact writes
    /// it. Unwritten paths are tolerated at release time.
    pub fn scratch_path(&self, extension: &str) -> PathBuf {
        let path = self.root.join(format!("{}.{}", Uuid::new_v4(), extension));
        self.handles.lock().unwrap().push(path.clone());
        path
    }

    /// Register a file created outside `scratch_path` so it is released
    /// with the job.
    pub fn adopt(&self, path: PathBuf) {
        self.handles.lock().unwrap().push(path);
    }

    /// Number of handles not yet released
    pub fn pending(&self) -> usize {
        if self.released.load(Ordering::Acquire) {
            0
        } else {
            self.handles.lock().unwrap().len()
        }
    }

    /// Whether release has already run
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Release every handle, last allocated first. Runs at most once;
    /// later calls are no-ops. Failures are logged, never raised.
    pub fn release_all(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }

        let handles = std::mem::take(&mut *self.handles.lock().unwrap());
        for path in handles.into_iter().rev() {
            match std::fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "released scratch file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    // Allocated but never written
                }
                Err(e) => {
                    let err = CleanupError {
                        path: path.display().to_string(),
                        message: e.to_string(),
                    };
                    warn!(error = %err, "scratch release failed");
                }
            }
        }

        if let Err(e) = std::fs::remove_dir(&self.root) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(dir = %self.root.display(), error = %e, "scratch dir removal failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_removes_files_and_dir() {
        let scratch = tempfile::tempdir().unwrap();
        let janitor = TempResourceJanitor::new(scratch.path(), "job-1").unwrap();

        let a = janitor.scratch_path("wav");
        let b = janitor.scratch_path("mp3");
        std::fs::write(&a, b"a").unwrap();
        std::fs::write(&b, b"b").unwrap();
        assert_eq!(janitor.pending(), 2);

        janitor.release_all();
        assert!(!a.exists());
        assert!(!b.exists());
        assert!(!scratch.path().join("job-1").exists());
        assert_eq!(janitor.pending(), 0);
    }

    #[test]
    fn test_release_runs_at_most_once() {
        let scratch = tempfile::tempdir().unwrap();
        let janitor = TempResourceJanitor::new(scratch.path(), "job-2").unwrap();
        let a = janitor.scratch_path("wav");
        std::fs::write(&a, b"a").unwrap();

        janitor.release_all();
        assert!(janitor.is_released());
        // Second call must be a no-op, not a panic
        janitor.release_all();
    }

    #[test]
    fn test_unwritten_paths_are_tolerated() {
        let scratch = tempfile::tempdir().unwrap();
        let janitor = TempResourceJanitor::new(scratch.path(), "job-3").unwrap();
        let _never_written = janitor.scratch_path("wav");
        janitor.release_all();
        assert!(janitor.is_released());
    }

    #[test]
    fn test_adopted_files_are_released() {
        let scratch = tempfile::tempdir().unwrap();
        let janitor = TempResourceJanitor::new(scratch.path(), "job-4").unwrap();
        let outside = scratch.path().join("job-4").join("adopted.bin");
        std::fs::write(&outside, b"x").unwrap();
        janitor.adopt(outside.clone());

        janitor.release_all();
        assert!(!outside.exists());
    }
}
