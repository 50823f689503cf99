//! Turning a list of user inputs into unpacking jobs.
//!
//! A file input is unpacked into `<parent>/<stem>_Unpacked`. A directory
//! input contributes its direct files, all unpacked into
//! `<dir>_Unpacked`. Inputs that are volumes of the same split set are
//! planned once: the set is identified by its first part, so `movie.001`,
//! `movie.002` and `movie.003` yield a single job.

use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use crate::Result;
use crate::formats::split::canonical_first_part;

/// Suffix appended to output directory names.
pub const OUTPUT_SUFFIX: &str = "_Unpacked";

/// One unpacking job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedInput {
    /// File to unpack.
    pub source: PathBuf,
    /// Directory receiving its content.
    pub output: PathBuf,
}

/// Result of [`plan_inputs`].
#[derive(Debug, Clone, Default)]
pub struct BatchPlan {
    /// Jobs in input order.
    pub inputs: Vec<PlannedInput>,
    /// Inputs dropped because their split set was already planned.
    pub duplicates: Vec<PathBuf>,
    /// Directory inputs that contained no files.
    pub empty_dirs: Vec<PathBuf>,
}

fn with_suffix(name: &std::ffi::OsStr) -> OsString {
    let mut out = name.to_owned();
    out.push(OUTPUT_SUFFIX);
    out
}

/// Output directory for a single file input.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use unnest_core::batch::output_for_file;
///
/// assert_eq!(
///     output_for_file(Path::new("/dl/movie.part1.rar"), None),
///     Path::new("/dl/movie.part1_Unpacked"),
/// );
/// assert_eq!(
///     output_for_file(Path::new("/dl/a.zip"), Some(Path::new("/out"))),
///     Path::new("/out/a_Unpacked"),
/// );
/// ```
#[must_use]
pub fn output_for_file(file: &Path, root: Option<&Path>) -> PathBuf {
    let parent = root.unwrap_or_else(|| file.parent().unwrap_or_else(|| Path::new("")));
    let stem = file.file_stem().unwrap_or_else(|| file.as_os_str());
    parent.join(with_suffix(stem))
}

/// Output directory for a directory input.
#[must_use]
pub fn output_for_dir(dir: &Path, root: Option<&Path>) -> PathBuf {
    let Some(name) = dir.file_name() else {
        return with_suffix(dir.as_os_str()).into();
    };
    match root {
        Some(root) => root.join(with_suffix(name)),
        None => dir.with_file_name(with_suffix(name)),
    }
}

/// Case-insensitive identity of the split set `path` belongs to.
fn set_key(path: &Path) -> String {
    canonical_first_part(path)
        .to_string_lossy()
        .to_lowercase()
}

/// Plans jobs for `paths`.
///
/// With `root` set, every output directory is created beneath it instead
/// of next to its input.
///
/// # Errors
///
/// Returns an I/O error if a directory input cannot be listed.
pub fn plan_inputs(paths: &[PathBuf], root: Option<&Path>) -> Result<BatchPlan> {
    let mut plan = BatchPlan::default();
    let mut seen = HashSet::new();

    for path in paths {
        if path.is_dir() {
            let mut files = fs::read_dir(path)?
                .filter_map(std::result::Result::ok)
                .map(|entry| entry.path())
                .filter(|p| p.is_file())
                .collect::<Vec<_>>();
            files.sort();
            tracing::info!(dir = %path.display(), files = files.len(), "scanning directory");

            if files.is_empty() {
                tracing::warn!(dir = %path.display(), "directory is empty");
                plan.empty_dirs.push(path.clone());
                continue;
            }

            let output = output_for_dir(path, root);
            // Deduplication inside a directory is local to it.
            let mut local = HashSet::new();
            for file in files {
                if local.insert(set_key(&file)) {
                    plan.inputs.push(PlannedInput {
                        source: file,
                        output: output.clone(),
                    });
                } else {
                    plan.duplicates.push(file);
                }
            }
        } else if seen.insert(set_key(path)) {
            plan.inputs.push(PlannedInput {
                source: path.clone(),
                output: output_for_file(path, root),
            });
        } else {
            tracing::info!(
                file = %path.display(),
                "Skipping duplicate split-volume input"
            );
            plan.duplicates.push(path.clone());
        }
    }

    tracing::debug!(
        planned = plan.inputs.len(),
        duplicates = plan.duplicates.len(),
        "batch planned"
    );
    Ok(plan)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"x").unwrap();
        path
    }

    #[test]
    fn test_split_set_planned_once() {
        let temp = TempDir::new().unwrap();
        let first = touch(temp.path(), "movie.001");
        let second = touch(temp.path(), "movie.002");
        let third = touch(temp.path(), "movie.003");

        let plan = plan_inputs(&[third.clone(), first, second.clone()], None).unwrap();

        assert_eq!(plan.inputs.len(), 1);
        assert_eq!(plan.inputs[0].source, third);
        assert_eq!(plan.inputs[0].output, temp.path().join("movie_Unpacked"));
        assert_eq!(plan.duplicates.len(), 2);
        assert!(plan.duplicates.contains(&second));
    }

    #[test]
    fn test_rar_part_sets_deduplicated_case_insensitively() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "Set.part1.rar");
        let second = touch(temp.path(), "Set.part2.rar");
        let other = touch(temp.path(), "other.zip");

        let plan = plan_inputs(&[temp.path().join("Set.part1.rar"), second, other], None).unwrap();

        assert_eq!(plan.inputs.len(), 2);
        assert_eq!(plan.duplicates.len(), 1);
    }

    #[test]
    fn test_missing_first_part_is_still_planned() {
        let temp = TempDir::new().unwrap();
        let third = touch(temp.path(), "demo.003");

        let plan = plan_inputs(&[third.clone()], None).unwrap();

        assert_eq!(plan.inputs[0].source, third);
    }

    #[test]
    fn test_directory_input() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("downloads");
        fs::create_dir_all(dir.join("nested")).unwrap();
        touch(&dir, "b.zip");
        touch(&dir, "a.7z.001");
        touch(&dir, "a.7z.002");
        touch(&dir.join("nested"), "ignored.zip");

        let plan = plan_inputs(&[dir.clone()], None).unwrap();

        let sources: Vec<_> = plan.inputs.iter().map(|p| p.source.clone()).collect();
        assert_eq!(sources, vec![dir.join("a.7z.001"), dir.join("b.zip")]);
        assert_eq!(plan.duplicates, vec![dir.join("a.7z.002")]);
        assert!(
            plan.inputs
                .iter()
                .all(|p| p.output == temp.path().join("downloads_Unpacked"))
        );
    }

    #[test]
    fn test_empty_directory_reported() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("empty");
        fs::create_dir_all(&dir).unwrap();

        let plan = plan_inputs(&[dir.clone()], None).unwrap();

        assert!(plan.inputs.is_empty());
        assert_eq!(plan.empty_dirs, vec![dir]);
    }

    #[test]
    fn test_output_root_override() {
        let temp = TempDir::new().unwrap();
        let file = touch(temp.path(), "a.zip");
        let root = temp.path().join("all");

        let plan = plan_inputs(&[file], Some(&root)).unwrap();

        assert_eq!(plan.inputs[0].output, root.join("a_Unpacked"));
    }
}
