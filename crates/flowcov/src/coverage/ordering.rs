//! Canonical ordering and merge helpers
//!
//! The canonical order is definition key ascending, then element id
//! ascending. Keys are plain strings, so there is no absent key to place.

use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Compare two coverage identities `(definition key, element id)`
#[must_use]
pub fn compare_identity(a: (&str, &str), b: (&str, &str)) -> Ordering {
    a.0.cmp(b.0).then_with(|| a.1.cmp(b.1))
}

/// Deduplicate records into canonical order
///
/// On identity collisions the first record in iteration order wins, so
/// feeding records in execution order keeps the earliest observation.
pub fn canonical<'a, T, I>(records: I) -> Vec<T>
where
    T: Ord + Clone + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut merged: BTreeSet<&T> = BTreeSet::new();
    for record in records {
        merged.insert(record);
    }
    merged.into_iter().cloned().collect()
}

/// Merge several canonical record lists into one
pub fn merge_canonical<T, I>(lists: I) -> Vec<T>
where
    T: Ord,
    I: IntoIterator<Item = Vec<T>>,
{
    let mut merged = BTreeSet::new();
    for list in lists {
        // Existing entries are never replaced by later duplicates.
        merged.extend(list);
    }
    merged.into_iter().collect()
}
