//! Progress-reporting reader.
//!
//! Stream formats (tar, gzip, bzip2, xz) have no entry count known up
//! front, so their progress is measured by how much of the compressed
//! input has been consumed.

use std::io::Read;

/// Converts a `done / total` ratio to a whole percentage in `0..=100`.
///
/// An empty total counts as complete.
///
/// # Examples
///
/// ```
/// use unnest_core::io::percent;
///
/// assert_eq!(percent(0, 200), 0);
/// assert_eq!(percent(50, 200), 25);
/// assert_eq!(percent(300, 200), 100);
/// assert_eq!(percent(0, 0), 100);
/// ```
#[must_use]
pub fn percent(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = done.saturating_mul(100) / total;
    u8::try_from(pct.min(100)).unwrap_or(100)
}

/// Reader wrapper that reports the share of `total` bytes read so far.
///
/// The callback fires only when the percentage changes, so a 1 GB stream
/// produces at most 101 ticks.
///
/// # Examples
///
/// ```
/// use std::io::Read;
/// use unnest_core::io::ProgressReader;
///
/// let data = vec![7u8; 1000];
/// let mut ticks = Vec::new();
/// let mut report = |pct: u8| ticks.push(pct);
/// let mut reader = ProgressReader::new(&data[..], 1000, &mut report);
/// let mut sink = Vec::new();
/// reader.read_to_end(&mut sink)?;
/// drop(reader);
///
/// assert_eq!(ticks.last(), Some(&100));
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct ProgressReader<'a, R> {
    /// Inner reader being wrapped
    inner: R,
    total: u64,
    bytes_read: u64,
    last_reported: Option<u8>,
    progress: &'a mut dyn FnMut(u8),
}

impl<'a, R> ProgressReader<'a, R> {
    /// Wraps `inner`, expecting `total` bytes in all.
    pub fn new(inner: R, total: u64, progress: &'a mut dyn FnMut(u8)) -> Self {
        Self {
            inner,
            total,
            bytes_read: 0,
            last_reported: None,
            progress,
        }
    }

    /// Returns the number of bytes read through this wrapper.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.bytes_read
    }
}

impl<R: Read> Read for ProgressReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.bytes_read = self.bytes_read.saturating_add(n as u64);
        let pct = percent(self.bytes_read, self.total);
        if self.last_reported != Some(pct) {
            self.last_reported = Some(pct);
            (self.progress)(pct);
        }
        Ok(n)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_bounds() {
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(u64::MAX, 1), 100);
    }

    #[test]
    fn test_ticks_are_monotonic_and_deduplicated() {
        let data = vec![0u8; 10_000];
        let mut ticks = Vec::new();
        let mut report = |pct: u8| ticks.push(pct);
        {
            let mut reader = ProgressReader::new(&data[..], 10_000, &mut report);
            let mut buf = [0u8; 100];
            while reader.read(&mut buf).unwrap() > 0 {}
            assert_eq!(reader.total_bytes(), 10_000);
        }

        assert_eq!(ticks.first(), Some(&1));
        assert_eq!(ticks.last(), Some(&100));
        assert!(ticks.windows(2).all(|w| w[0] < w[1]));
    }
}
