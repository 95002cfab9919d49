use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{Requirement, Selector};

/// A constraint pruning invalid combinations of dimension values.
///
/// Filters see a *partial* assignment while a test case is being built, so
/// a filter that cannot decide yet (because a dimension it looks at is still
/// unassigned) accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Filter {
    /// Rejects any assignment holding one of the listed values for *every*
    /// listed dimension.
    Exclude {
        /// Human-readable explanation of the constraint.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,

        /// Restricts the filter to matching requirements.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        requirements: Option<Selector>,

        /// The combination to exclude.
        matches: BTreeMap<String, Values>,
    },

    /// Once every `when` dimension holds one of its listed values, each
    /// `then` dimension must hold one of its listed values.
    Require {
        /// Human-readable explanation of the constraint.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,

        /// Restricts the filter to matching requirements.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        requirements: Option<Selector>,

        /// The triggering combination.
        when: BTreeMap<String, Values>,

        /// The values permitted once triggered.
        then: BTreeMap<String, Values>,
    },
}

/// One or more dimension values.
///
/// Written either as a single string or as a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "OneOrMany")]
pub struct Values(Vec<String>);

impl Values {
    /// Returns `true` if `value` is one of the listed values.
    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.0.iter().any(|v| v == value)
    }

    /// Iterates over the listed values.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl From<OneOrMany> for Values {
    fn from(value: OneOrMany) -> Self {
        match value {
            OneOrMany::One(v) => Self(vec![v]),
            OneOrMany::Many(vs) => Self(vs),
        }
    }
}

/// Outcome of matching a condition against a partial assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Match {
    /// Every dimension is assigned and holds a listed value.
    Yes,
    /// Some assigned dimension holds an unlisted value.
    No,
    /// Some dimension is unassigned and no assigned one contradicts.
    Undecided,
}

fn match_condition(condition: &BTreeMap<String, Values>, partial: &[(&str, &str)]) -> Match {
    let mut outcome = Match::Yes;
    for (dimension, values) in condition {
        match lookup(partial, dimension) {
            Some(value) if values.contains(value) => {}
            Some(_) => return Match::No,
            None => outcome = Match::Undecided,
        }
    }
    outcome
}

fn lookup<'a>(partial: &[(&str, &'a str)], dimension: &str) -> Option<&'a str> {
    partial
        .iter()
        .find(|(name, _)| *name == dimension)
        .map(|(_, value)| *value)
}

impl Filter {
    /// Decides whether the filter accepts a (possibly partial) assignment for
    /// the given requirement.
    ///
    /// `partial` holds `(dimension, value)` pairs for the dimensions assigned
    /// so far.
    #[must_use]
    pub fn accepts(&self, partial: &[(&str, &str)], requirement: &Requirement) -> bool {
        if !self.selector().is_none_or(|s| s.matches(requirement)) {
            return true;
        }

        match self {
            Self::Exclude { matches, .. } => {
                // an empty combination would exclude everything
                matches.is_empty() || match_condition(matches, partial) != Match::Yes
            }
            Self::Require { when, then, .. } => {
                if match_condition(when, partial) != Match::Yes {
                    return true;
                }
                then.iter().all(|(dimension, values)| {
                    lookup(partial, dimension).is_none_or(|value| values.contains(value))
                })
            }
        }
    }

    /// The requirement selector restricting this filter, if any.
    #[must_use]
    pub const fn selector(&self) -> Option<&Selector> {
        match self {
            Self::Exclude { requirements, .. } | Self::Require { requirements, .. } => {
                requirements.as_ref()
            }
        }
    }

    /// The human-readable description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Exclude { description, .. } | Self::Require { description, .. } => {
                description.as_deref()
            }
        }
    }

    /// Every `(dimension, value)` the filter refers to.
    pub fn references(&self) -> impl Iterator<Item = (&str, &str)> {
        let conditions: Vec<&BTreeMap<String, Values>> = match self {
            Self::Exclude { matches, .. } => vec![matches],
            Self::Require { when, then, .. } => vec![when, then],
        };
        conditions.into_iter().flat_map(|condition| {
            condition
                .iter()
                .flat_map(|(dimension, values)| values.iter().map(move |v| (dimension.as_str(), v)))
        })
    }
}
