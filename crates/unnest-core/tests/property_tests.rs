//! Property-based tests for name classification and signature sniffing.

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use std::path::Path;
use std::path::PathBuf;
use unnest_core::formats::detect::detect_format_bytes;
use unnest_core::formats::split::canonical_first_part;
use unnest_core::formats::split::expected_first_part;
use unnest_core::formats::split::is_non_first_part;
use unnest_core::strategy::mask_password;

proptest! {
    /// Numeric volumes past the first point back at `.001` in the same directory.
    #[test]
    fn prop_numeric_continuation_points_to_001(
        stem in "[a-z][a-z0-9_]{0,8}",
        n in 2u32..=999,
    ) {
        let part = PathBuf::from(format!("/downloads/{stem}.{n:03}"));
        prop_assert!(is_non_first_part(&part));
        prop_assert_eq!(
            expected_first_part(&part),
            Some(PathBuf::from(format!("/downloads/{stem}.001")))
        );
    }

    /// `.001` is always a first part.
    #[test]
    fn prop_numeric_first_part(stem in "[a-z][a-z0-9_]{0,8}") {
        let first = PathBuf::from(format!("{stem}.001"));
        prop_assert!(!is_non_first_part(&first));
        prop_assert_eq!(expected_first_part(&first), None);
    }

    /// RAR part numbering keeps its zero padding when resolving the first part.
    #[test]
    fn prop_rar_part_keeps_padding(
        prefix in "[a-z]{1,8}",
        n in 2usize..100,
        width in 2usize..=3,
    ) {
        let part = PathBuf::from(format!("{prefix}.part{n:0width$}.rar"));
        let first = PathBuf::from(format!("{prefix}.part{:0width$}.rar", 1));
        prop_assert!(is_non_first_part(&part));
        prop_assert!(!is_non_first_part(&first));
        prop_assert_eq!(expected_first_part(&part), Some(first));
    }

    /// Without a first part on disk, resolution leaves the path unchanged.
    #[test]
    fn prop_canonical_without_first_part_is_identity(
        stem in "[a-z]{1,8}",
        n in 2u32..=999,
    ) {
        let part = PathBuf::from(format!("/nonexistent-unnest-dir/{stem}.{n:03}"));
        prop_assert_eq!(canonical_first_part(&part), part);
    }

    /// Arbitrary bytes never make the signature table panic.
    #[test]
    fn prop_detect_never_panics(header in proptest::collection::vec(any::<u8>(), 0..600)) {
        let _ = detect_format_bytes(&header);
    }

    /// Masked passwords reveal at most two characters.
    #[test]
    fn prop_mask_reveals_at_most_two_chars(password in "\\PC{3,20}") {
        let masked = mask_password(&password);
        let head: String = password.chars().take(2).collect();
        prop_assert!(masked.starts_with(&head));
        prop_assert!(masked.chars().skip(2).all(|c| c == '*'));
        prop_assert!(masked.chars().count() <= 6);
    }
}

#[test]
fn test_plain_archives_are_not_volumes() {
    for name in ["a.zip", "a.rar", "a.7z", "a.tar.gz", "a.part1.rar", "README"] {
        assert!(!is_non_first_part(Path::new(name)), "{name}");
    }
}
