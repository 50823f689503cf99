//! Per-file password ordering.

use std::collections::HashSet;
use std::path::Path;

use crate::Settings;

/// Produces the ordered list of passwords to try for a file.
///
/// The sequence is always: the empty password, the file's stem, then the
/// configured passwords in order. Empty entries and repeats are dropped.
/// It is recomputed for every file, since the stem differs.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use unnest_core::PasswordSequencer;
/// use unnest_core::Settings;
///
/// let settings = Settings::default().with_passwords(["a", "x", "", "a"]);
/// let sequencer = PasswordSequencer::new(&settings);
///
/// assert_eq!(sequencer.sequence(Path::new("dir/x.tif")), vec!["", "x", "a"]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PasswordSequencer<'a> {
    passwords: &'a [String],
}

impl<'a> PasswordSequencer<'a> {
    /// Creates a sequencer over the settings' password list.
    #[must_use]
    pub fn new(settings: &'a Settings) -> Self {
        Self {
            passwords: &settings.passwords,
        }
    }

    /// Returns the passwords to try for `path`, in order.
    #[must_use]
    pub fn sequence(&self, path: &Path) -> Vec<String> {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut seen: HashSet<&str> = HashSet::with_capacity(self.passwords.len() + 2);
        let mut sequence = Vec::with_capacity(self.passwords.len() + 2);
        for candidate in std::iter::once("")
            .chain((!stem.is_empty()).then_some(stem.as_str()))
            .chain(self.passwords.iter().map(String::as_str))
        {
            if seen.insert(candidate) {
                sequence.push(candidate.to_owned());
            }
        }

        tracing::debug!(
            file = %path.display(),
            configured = self.passwords.len(),
            attempts = sequence.len(),
            "password sequence"
        );
        sequence
    }
}
