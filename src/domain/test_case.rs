use std::fmt;

use borsh::BorshSerialize;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::RequirementId;

/// One dimension-value pair of a test case's assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// The name of the dimension.
    pub dimension: String,
    /// The value assigned to the dimension.
    pub value: String,
    /// The position of the value in the dimension's declared domain.
    pub position: usize,
}

impl Assignment {
    /// Creates a new assignment.
    #[must_use]
    pub fn new(dimension: impl Into<String>, value: impl Into<String>, position: usize) -> Self {
        Self {
            dimension: dimension.into(),
            value: value.into(),
            position,
        }
    }
}

/// A test case: one requirement paired with a complete assignment of a value
/// to every dimension of the generation set that produced it.
///
/// Test cases are immutable once generated. Two test cases are the *same*
/// case when their [`IdentityKey`]s are equal, regardless of which set
/// produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    requirement: RequirementId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    summary: Option<String>,

    #[serde(default)]
    assignment: Vec<Assignment>,
}

impl TestCase {
    /// Creates a test case.
    ///
    /// The assignment is stored ordered by dimension name, so two identical
    /// cases built by different generation sets are indistinguishable.
    #[must_use]
    pub fn new(
        requirement: RequirementId,
        summary: Option<String>,
        mut assignment: Vec<Assignment>,
    ) -> Self {
        assignment.sort_by(|a, b| a.dimension.cmp(&b.dimension));
        Self {
            requirement,
            summary,
            assignment,
        }
    }

    /// The requirement under test.
    #[must_use]
    pub const fn requirement(&self) -> &RequirementId {
        &self.requirement
    }

    /// The title of the requirement at generation time, if it had one.
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// The dimension-value assignment, ordered by dimension name.
    #[must_use]
    pub fn assignment(&self) -> &[Assignment] {
        &self.assignment
    }

    /// Returns the value assigned to the named dimension.
    #[must_use]
    pub fn value_of(&self, dimension: &str) -> Option<&str> {
        self.assignment
            .iter()
            .find(|a| a.dimension == dimension)
            .map(|a| a.value.as_str())
    }

    /// The semantic identity of this test case.
    #[must_use]
    pub fn identity_key(&self) -> IdentityKey {
        let mut assignment: Vec<(String, String)> = self
            .assignment
            .iter()
            .map(|a| (a.dimension.clone(), a.value.clone()))
            .collect();
        assignment.sort();
        IdentityKey {
            requirement: self.requirement.clone(),
            assignment,
        }
    }

    /// The key the deterministic sort orders by.
    ///
    /// Requirement identifier first, then each assignment ordered by
    /// dimension name, comparing dimension name, declared position, then the
    /// value itself. No two test cases with distinct identity keys compare
    /// equal.
    #[must_use]
    pub fn sort_key(&self) -> SortKey<'_> {
        let mut entries: Vec<(&str, usize, &str)> = self
            .assignment
            .iter()
            .map(|a| (a.dimension.as_str(), a.position, a.value.as_str()))
            .collect();
        entries.sort_unstable();
        SortKey {
            requirement: self.requirement.as_str(),
            entries,
        }
    }

    /// Adopts the smaller declared position of each value shared with an
    /// identical test case.
    ///
    /// Used when merging duplicates so the retained case sorts the same way
    /// whichever copy was seen first.
    pub(crate) fn adopt_lower_positions(&mut self, other: &Self) {
        for entry in &mut self.assignment {
            if let Some(theirs) = other
                .assignment
                .iter()
                .find(|a| a.dimension == entry.dimension && a.value == entry.value)
            {
                entry.position = entry.position.min(theirs.position);
            }
        }
    }
}

impl fmt::Display for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.requirement)?;
        if self.assignment.is_empty() {
            return write!(f, " (no dimensions)");
        }
        write!(f, ":")?;
        for (i, a) in self.assignment.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{sep}{}={}", a.dimension, a.value)?;
        }
        Ok(())
    }
}

/// The semantic equality key of a test case.
///
/// The requirement identifier plus the assignment as `(dimension, value)`
/// pairs sorted by dimension name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IdentityKey {
    requirement: RequirementId,
    assignment: Vec<(String, String)>,
}

impl IdentityKey {
    /// The requirement component of the key.
    #[must_use]
    pub const fn requirement(&self) -> &RequirementId {
        &self.requirement
    }

    /// The sorted `(dimension, value)` pairs of the key.
    #[must_use]
    pub fn assignment(&self) -> &[(String, String)] {
        &self.assignment
    }

    /// A stable SHA256 digest of the key, as lowercase hex.
    ///
    /// # Panics
    ///
    /// Panics if borsh serialization fails (which should never happen for this
    /// data structure).
    #[must_use]
    pub fn digest(&self) -> String {
        #[derive(BorshSerialize)]
        struct DigestData<'a> {
            requirement: &'a str,
            assignment: &'a [(String, String)],
        }

        let data = DigestData {
            requirement: self.requirement.as_str(),
            assignment: &self.assignment,
        };

        // encode using [borsh](https://borsh.io/)
        let encoded = borsh::to_vec(&data).expect("this should never fail");

        let hash = Sha256::digest(encoded);
        format!("{hash:x}")
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.requirement)?;
        for (i, (dimension, value)) in self.assignment.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{dimension}={value}")?;
        }
        write!(f, "]")
    }
}

/// Borrowed ordering key of a [`TestCase`]. See [`TestCase::sort_key`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SortKey<'a> {
    requirement: &'a str,
    entries: Vec<(&'a str, usize, &'a str)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(requirement: &str, assignment: &[(&str, &str, usize)]) -> TestCase {
        TestCase::new(
            RequirementId::new(requirement).unwrap(),
            None,
            assignment
                .iter()
                .map(|(d, v, p)| Assignment::new(*d, *v, *p))
                .collect(),
        )
    }

    #[test]
    fn identity_ignores_assignment_order_and_positions() {
        let a = case("R1", &[("Browser", "chrome", 0), ("Locale", "en", 0)]);
        let b = case("R1", &[("Locale", "en", 3), ("Browser", "chrome", 1)]);
        assert_eq!(a.identity_key(), b.identity_key());
        assert_eq!(a.identity_key().digest(), b.identity_key().digest());
    }

    #[test]
    fn identity_distinguishes_requirements() {
        let a = case("R1", &[("Browser", "chrome", 0)]);
        let b = case("R2", &[("Browser", "chrome", 0)]);
        assert_ne!(a.identity_key(), b.identity_key());
        assert_ne!(a.identity_key().digest(), b.identity_key().digest());
    }

    #[test]
    fn identity_key_display() {
        let a = case("R1", &[("Locale", "en", 0), ("Browser", "chrome", 0)]);
        assert_eq!(a.identity_key().to_string(), "R1[Browser=chrome,Locale=en]");
    }

    #[test]
    fn sort_key_uses_position_before_value() {
        let zulu = case("R1", &[("Browser", "zulu", 0)]);
        let alpha = case("R1", &[("Browser", "alpha", 1)]);
        assert!(zulu.sort_key() < alpha.sort_key());
    }

    #[test]
    fn sort_key_orders_dimensions_by_name() {
        let a = case("R1", &[("Locale", "fr", 1), ("Browser", "chrome", 0)]);
        let b = case("R1", &[("Locale", "en", 0), ("Browser", "firefox", 1)]);
        assert!(a.sort_key() < b.sort_key());
    }

    #[test]
    fn adopt_lower_positions_takes_minimum() {
        let mut a = case("R1", &[("Browser", "chrome", 2)]);
        let b = case("R1", &[("Browser", "chrome", 0)]);
        a.adopt_lower_positions(&b);
        assert_eq!(a.assignment()[0].position, 0);
    }

    #[test]
    fn display_lists_assignment() {
        let a = case("R1", &[("Browser", "chrome", 0), ("Locale", "en", 0)]);
        assert_eq!(a.to_string(), "R1: Browser=chrome, Locale=en");
        assert_eq!(case("R1", &[]).to_string(), "R1 (no dimensions)");
    }
}
