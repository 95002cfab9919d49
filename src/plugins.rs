//! Plugin registries.
//!
//! Two kinds of plugins extend the tool, each dispatched through a fixed
//! registry of named trait objects:
//!
//! - [`sources`]: requirements generators, which turn external sources into
//!   requirement files;
//! - [`markup`]: renderers, which turn one test case into formatted text.

pub mod markup;
pub mod sources;

pub use markup::{MarkupPlugin, MarkupRegistry, RenderError};
pub use sources::{PluginError, RequirementsGenerator, SourceRegistry};
