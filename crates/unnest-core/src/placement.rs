//! Copying final content into the output directory.
//!
//! Placement never moves and never overwrites: a name already taken gets a
//! numeric suffix before its extension, and directories merge into
//! existing ones. Symbolic links are skipped.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use walkdir::WalkDir;

use crate::Result;

/// Counts of what a placement created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Placed {
    /// Files copied.
    pub files: usize,
    /// Directories created.
    pub directories: usize,
}

impl std::ops::AddAssign for Placed {
    fn add_assign(&mut self, other: Self) {
        self.files += other.files;
        self.directories += other.directories;
    }
}

fn occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Returns a path in `dir` for `name` that does not exist yet.
///
/// # Examples
///
/// ```
/// use std::fs;
/// use unnest_core::placement::unique_path;
///
/// let dir = tempfile::tempdir()?;
/// assert_eq!(unique_path(dir.path(), "a.txt"), dir.path().join("a.txt"));
///
/// fs::write(dir.path().join("a.txt"), b"1")?;
/// fs::write(dir.path().join("a_1.txt"), b"2")?;
/// assert_eq!(unique_path(dir.path(), "a.txt"), dir.path().join("a_2.txt"));
/// # Ok::<(), std::io::Error>(())
/// ```
#[must_use]
pub fn unique_path(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(name);
    if !occupied(&candidate) {
        return candidate;
    }

    let as_path = Path::new(name);
    let stem = as_path
        .file_stem()
        .map_or_else(|| name.to_owned(), |s| s.to_string_lossy().into_owned());
    let ext = as_path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    (1u64..)
        .map(|n| dir.join(format!("{stem}_{n}{ext}")))
        .find(|p| !occupied(p))
        .unwrap_or(candidate)
}

/// Copies the file at `source` into `dest_dir`, creating `dest_dir` if
/// needed.
///
/// Returns the path written.
///
/// # Errors
///
/// Returns an I/O error if the copy fails.
pub fn place_file(source: &Path, dest_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dest_dir)?;
    let name = source
        .file_name()
        .map_or_else(|| "file".to_owned(), |n| n.to_string_lossy().into_owned());
    let target = unique_path(dest_dir, &name);
    fs::copy(source, &target)?;
    tracing::debug!(from = %source.display(), to = %target.display(), "placed file");
    Ok(target)
}

/// Copies the directory `source` to `dest_dir/<name of source>`, merging
/// with a directory already there.
///
/// # Errors
///
/// Returns an I/O error if reading or copying fails.
pub fn place_dir(source: &Path, dest_dir: &Path) -> Result<Placed> {
    let name = source
        .file_name()
        .map_or_else(|| "folder".to_owned(), |n| n.to_string_lossy().into_owned());
    fs::create_dir_all(dest_dir)?;
    let (target, created) = directory_slot(dest_dir, &name)?;
    let mut placed = merge_contents(source, &target)?;
    placed.directories += usize::from(created);
    Ok(placed)
}

/// Copies everything inside `source` into `dest_dir`, merging directories
/// and suffixing clashing file names.
///
/// Entries are visited in name order so that suffixes are assigned
/// deterministically.
///
/// # Errors
///
/// Returns an I/O error if reading or copying fails.
pub fn merge_contents(source: &Path, dest_dir: &Path) -> Result<Placed> {
    fs::create_dir_all(dest_dir)?;
    let mut placed = Placed::default();
    // Where each source directory (relative to `source`) ended up.
    let mut targets: HashMap<PathBuf, PathBuf> = HashMap::new();
    targets.insert(PathBuf::new(), dest_dir.to_path_buf());

    let walker = WalkDir::new(source)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name();
    for entry in walker {
        let entry = entry.map_err(|e| {
            e.into_io_error()
                .unwrap_or_else(|| std::io::Error::other("directory walk failed"))
        })?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(std::io::Error::other)?
            .to_path_buf();
        let parent_rel = relative.parent().map(Path::to_path_buf).unwrap_or_default();
        let Some(parent_target) = targets.get(&parent_rel).cloned() else {
            // Parent was skipped (symlinked directory).
            continue;
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        let file_type = entry.file_type();

        if file_type.is_symlink() {
            tracing::debug!(path = %entry.path().display(), "skipping symbolic link");
        } else if file_type.is_dir() {
            let (target, created) = directory_slot(&parent_target, &name)?;
            placed.directories += usize::from(created);
            targets.insert(relative, target);
        } else {
            let target = unique_path(&parent_target, &name);
            fs::copy(entry.path(), &target)?;
            placed.files += 1;
        }
    }
    Ok(placed)
}

/// Finds or creates the directory `parent/name`.
///
/// An existing directory is reused. If a file holds the name, a suffixed
/// name is used instead. Returns the directory and whether it was created.
fn directory_slot(parent: &Path, name: &str) -> Result<(PathBuf, bool)> {
    let direct = parent.join(name);
    if direct.is_dir() && !direct.is_symlink() {
        return Ok((direct, false));
    }
    let target = unique_path(parent, name);
    fs::create_dir_all(&target)?;
    Ok((target, true))
}
