//! Domain models for test-case generation.
//!
//! This module contains the core domain types: requirements, the dimensions
//! and filters of a generation set, the configuration that groups them, and
//! the test cases they produce.

mod config;
pub use config::{Config, ConfigError, GenerationOptions, GenerationSet, Strategy};

mod dimension;
pub use dimension::{Dimension, DimensionValue, DomainValue};

/// Filter predicates over partial assignments.
pub mod filter;
pub use filter::Filter;

/// Requirement domain model.
pub mod requirement;
pub use requirement::{EmptyIdError, Requirement, RequirementId};

mod selector;
pub use selector::Selector;

/// Test cases and their identity.
pub mod test_case;
pub use self::test_case::{Assignment, IdentityKey, TestCase};

pub mod store;
pub use store::{DuplicateIdError, RequirementStore};
