//! Per-session scratch workspace.

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use tempfile::TempDir;

use crate::ExtractionError;
use crate::Result;

/// A uniquely named temporary directory handing out fresh subdirectories.
///
/// Every extraction attempt gets its own subdirectory, so a failed attempt
/// never leaves partial output where the next one writes. The whole tree is
/// removed by [`close`](Self::close), or on drop if `close` is never
/// reached.
///
/// # Examples
///
/// ```
/// use unnest_core::io::Scratch;
///
/// let scratch = Scratch::new()?;
/// let a = scratch.allocate()?;
/// let b = scratch.allocate()?;
/// assert_ne!(a, b);
/// assert!(a.starts_with(scratch.path()));
/// scratch.close()?;
/// assert!(!a.exists());
/// # Ok::<(), unnest_core::ExtractionError>(())
/// ```
#[derive(Debug)]
pub struct Scratch {
    root: TempDir,
    next: AtomicU64,
}

impl Scratch {
    /// Creates the workspace in the system temporary directory.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be created.
    pub fn new() -> Result<Self> {
        let root = tempfile::Builder::new().prefix("unnest-").tempdir()?;
        tracing::debug!(path = %root.path().display(), "scratch directory created");
        Ok(Self {
            root,
            next: AtomicU64::new(0),
        })
    }

    /// Returns the workspace root.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Creates and returns a new, empty subdirectory.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be created.
    pub fn allocate(&self) -> Result<PathBuf> {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        let dir = self.root.path().join(format!("x{n}"));
        fs::create_dir(&dir)?;
        Ok(dir)
    }

    /// Removes a subdirectory that is no longer needed.
    ///
    /// Failures are only logged; the directory goes away with the
    /// workspace at the latest.
    pub fn discard(dir: &Path) {
        if let Err(err) = fs::remove_dir_all(dir) {
            tracing::debug!(
                path = %dir.display(),
                error = %err,
                "could not discard attempt directory"
            );
        }
    }

    /// Deletes the workspace.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::Cleanup`] if the tree cannot be removed.
    pub fn close(self) -> Result<()> {
        let path = self.root.path().to_path_buf();
        self.root
            .close()
            .map_err(|source| ExtractionError::Cleanup { path, source })
    }
}
