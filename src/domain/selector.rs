use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::domain::{Requirement, RequirementId};

/// A predicate over requirements.
///
/// Selectors decide which requirements a generation set covers, which
/// requirements a dimension value applies to, and which requirements a
/// filter constrains.
///
/// Every non-empty criterion must hold for a requirement to match. An empty
/// selector matches every requirement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Selector {
    /// The requirement must be one of these.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<RequirementId>,

    /// The requirement must carry at least one of these tags.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,

    /// The requirement must carry all of these tags.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub all_tags: BTreeSet<String>,

    /// The requirement's metadata must hold exactly these values.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl Selector {
    /// Returns `true` if the selector has no criteria.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
            && self.tags.is_empty()
            && self.all_tags.is_empty()
            && self.metadata.is_empty()
    }

    /// Returns `true` if the requirement satisfies every criterion.
    #[must_use]
    pub fn matches(&self, requirement: &Requirement) -> bool {
        (self.ids.is_empty() || self.ids.contains(requirement.id()))
            && (self.tags.is_empty() || self.tags.iter().any(|t| requirement.has_tag(t)))
            && self.all_tags.iter().all(|t| requirement.has_tag(t))
            && self
                .metadata
                .iter()
                .all(|(key, value)| requirement.metadata().get(key) == Some(value))
    }
}
