//! Combinatorial test-case generation
//!
//! Requirements are paired with every valid combination of scenario
//! dimension values declared in a configuration file. The resulting test
//! cases are deduplicated, put in a deterministic order, and saved or
//! rendered through plugins.

pub mod domain;
pub use domain::{Config, Requirement, RequirementId, RequirementStore, TestCase};

/// Expansion of generation sets into a merged, ordered collection.
pub mod engine;
pub use engine::{Generation, run};

/// Requirements generators and markup renderers.
pub mod plugins;

/// Filesystem layout, requirement loading, and test-case persistence.
pub mod storage;
pub use storage::Paths;
