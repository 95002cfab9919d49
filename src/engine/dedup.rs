use std::collections::{HashMap, hash_map::Entry};

use crate::domain::{IdentityKey, TestCase};

/// Merges streams of test cases, keeping one test case per identity key.
///
/// Equality is semantic: two test cases are the same case when their
/// requirement and `(dimension, value)` assignment are equal, whichever
/// generation set produced them. The first one encountered is retained and
/// the output preserves first-encounter order.
pub fn merge<I, S>(streams: I) -> Vec<TestCase>
where
    I: IntoIterator<Item = S>,
    S: IntoIterator<Item = TestCase>,
{
    let mut seen: HashMap<IdentityKey, usize> = HashMap::new();
    let mut merged: Vec<TestCase> = Vec::new();

    for case in streams.into_iter().flatten() {
        match seen.entry(case.identity_key()) {
            Entry::Occupied(entry) => {
                tracing::trace!("merging duplicate test case {}", entry.key());
                merged[*entry.get()].adopt_lower_positions(&case);
            }
            Entry::Vacant(entry) => {
                entry.insert(merged.len());
                merged.push(case);
            }
        }
    }

    merged
}
