use proptest::prelude::*;
use sync_fs::{Checksum, NormalizedPath};

proptest! {
    #[test]
    fn normalized_paths_have_no_backslashes_or_double_slashes(s in "\\PC*") {
        let path = NormalizedPath::new(&s);
        prop_assert!(!path.as_str().contains('\\'));
        prop_assert!(!path.as_str().contains("//"));
    }

    #[test]
    fn normalization_is_idempotent(s in "[a-z/\\\\.]{0,40}") {
        let once = NormalizedPath::new(&s);
        let twice = NormalizedPath::new(once.as_str());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn checksum_is_deterministic(s in "\\PC*") {
        prop_assert_eq!(Checksum::of_str(&s), Checksum::of_str(&s));
    }
}
