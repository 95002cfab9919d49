//! An in-memory store of requirements.
//!
//! The [`RequirementStore`] knows nothing about the filesystem. It is the
//! read-only view of the requirement space the generation engine works on.

use std::collections::{BTreeMap, btree_map::Entry};

use crate::domain::{Requirement, RequirementId};

/// A keyed collection of requirements, ordered by identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementStore {
    requirements: BTreeMap<RequirementId, Requirement>,
}

/// A requirement identifier appeared more than once.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("duplicate requirement identifier '{0}'")]
pub struct DuplicateIdError(pub RequirementId);

impl RequirementStore {
    /// Creates an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            requirements: BTreeMap::new(),
        }
    }

    /// Inserts a requirement.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicateIdError`] if a requirement with the same identifier
    /// is already present. The store is left unchanged.
    pub fn insert(&mut self, requirement: Requirement) -> Result<(), DuplicateIdError> {
        match self.requirements.entry(requirement.id().clone()) {
            Entry::Occupied(entry) => Err(DuplicateIdError(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(requirement);
                Ok(())
            }
        }
    }

    /// Looks up a requirement by identifier.
    #[must_use]
    pub fn get(&self, id: &RequirementId) -> Option<&Requirement> {
        self.requirements.get(id)
    }

    /// Returns `true` if a requirement with the identifier exists.
    #[must_use]
    pub fn contains(&self, id: &RequirementId) -> bool {
        self.requirements.contains_key(id)
    }

    /// Iterates over the requirements in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Requirement> {
        self.requirements.values()
    }

    /// The number of requirements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    /// Returns `true` if the store holds no requirements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }
}

impl TryFrom<Vec<Requirement>> for RequirementStore {
    type Error = DuplicateIdError;

    fn try_from(requirements: Vec<Requirement>) -> Result<Self, Self::Error> {
        let mut store = Self::new();
        for requirement in requirements {
            store.insert(requirement)?;
        }
        Ok(store)
    }
}
