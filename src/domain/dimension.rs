use serde::{Deserialize, Serialize};

use crate::domain::{Requirement, Selector};

/// A named test-parameter axis with a finite, ordered domain of values.
///
/// The declaration order of the values is significant: it breaks ties in
/// pairwise construction and orders test cases that share a requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Dimension {
    /// The name of the dimension, unique within its generation set.
    pub name: String,

    /// The domain of the dimension, in declaration order.
    pub values: Vec<DimensionValue>,
}

/// A single value in the domain of a [`Dimension`].
///
/// On disk a value is either a bare string, which applies to every
/// requirement, or a table with an `applies_to` selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ValueRepr", into = "ValueRepr")]
pub struct DimensionValue {
    /// The value itself.
    pub value: String,

    /// The requirements this value applies to. `None` means all of them.
    pub applies_to: Option<Selector>,
}

impl DimensionValue {
    /// Returns `true` if this value applies to the requirement.
    #[must_use]
    pub fn applies_to(&self, requirement: &Requirement) -> bool {
        self.applies_to
            .as_ref()
            .is_none_or(|selector| selector.matches(requirement))
    }
}

impl From<&str> for DimensionValue {
    fn from(value: &str) -> Self {
        Self {
            value: value.to_string(),
            applies_to: None,
        }
    }
}

/// A value of a dimension after restriction to one requirement, paired with
/// its position in the declared domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainValue<'a> {
    /// Index of the value in the dimension's declared domain.
    pub position: usize,
    /// The value.
    pub value: &'a str,
}

impl Dimension {
    /// Creates a dimension whose values apply to every requirement.
    #[must_use]
    pub fn new<I, V>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<DimensionValue>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Restricts the domain to the values that apply to the requirement,
    /// preserving declaration order.
    #[must_use]
    pub fn restrict(&self, requirement: &Requirement) -> Vec<DomainValue<'_>> {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, value)| value.applies_to(requirement))
            .map(|(position, value)| DomainValue {
                position,
                value: &value.value,
            })
            .collect()
    }

    /// Returns the declared position of a value, if it is in the domain.
    #[must_use]
    pub fn position_of(&self, value: &str) -> Option<usize> {
        self.values.iter().position(|v| v.value == value)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum ValueRepr {
    Plain(String),
    Detailed {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        applies_to: Option<Selector>,
    },
}

impl From<ValueRepr> for DimensionValue {
    fn from(repr: ValueRepr) -> Self {
        match repr {
            ValueRepr::Plain(value) => Self {
                value,
                applies_to: None,
            },
            ValueRepr::Detailed { value, applies_to } => Self { value, applies_to },
        }
    }
}

impl From<DimensionValue> for ValueRepr {
    fn from(value: DimensionValue) -> Self {
        match value.applies_to {
            None => Self::Plain(value.value),
            Some(applies_to) => Self::Detailed {
                value: value.value,
                applies_to: Some(applies_to),
            },
        }
    }
}
