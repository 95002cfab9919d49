//! Requirements generators.
//!
//! A generator reads the files under `sources/<name>/` and produces
//! requirement records, which [`run`] writes to `<name>.yaml` in the
//! requirements directory. The generation engine only ever sees the written
//! files.

use std::{
    collections::BTreeMap,
    io,
    path::{Path, PathBuf},
};

use tracing::instrument;

use crate::{
    domain::{DuplicateIdError, EmptyIdError, Requirement, RequirementStore},
    storage::{Paths, requirements},
};

mod csv;
mod markdown;

/// Errors that can occur while generating requirements from a source.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// The plugin's source directory does not exist.
    #[error("source directory {} does not exist", .0.display())]
    MissingInput(PathBuf),

    /// A source file could not be read, or the output could not be written.
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        /// The file being accessed.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// A source file is not in the format the plugin expects.
    #[error("{}: {message}", .path.display())]
    Format {
        /// The offending file.
        path: PathBuf,
        /// What is wrong with it.
        message: String,
    },

    /// Markdown frontmatter is not valid YAML.
    #[error("invalid frontmatter in {}: {source}", .path.display())]
    Frontmatter {
        /// The offending file.
        path: PathBuf,
        /// The underlying error.
        source: serde_yaml::Error,
    },

    /// A CSV file could not be parsed.
    #[error("invalid CSV in {}: {source}", .path.display())]
    Csv {
        /// The offending file.
        path: PathBuf,
        /// The underlying error.
        source: ::csv::Error,
    },

    /// Two sources produced the same requirement identifier.
    #[error(transparent)]
    Duplicate(#[from] DuplicateIdError),
}

impl PluginError {
    fn format(path: &Path, message: impl Into<String>) -> Self {
        Self::Format {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    fn empty_id(path: &Path, error: &EmptyIdError) -> Self {
        Self::format(path, error.to_string())
    }
}

/// Produces requirements from the files in a source directory.
pub trait RequirementsGenerator: Send + Sync {
    /// The plugin name. Also names its source directory and output file.
    fn name(&self) -> &'static str;

    /// A one-line description for listings.
    fn description(&self) -> &'static str;

    /// Reads every source file under `input`.
    ///
    /// # Errors
    ///
    /// Returns an error if a source file cannot be read or is malformed.
    fn generate(&self, input: &Path) -> Result<Vec<Requirement>, PluginError>;
}

/// The fixed set of requirements generators, keyed by name.
pub struct SourceRegistry {
    plugins: BTreeMap<&'static str, Box<dyn RequirementsGenerator>>,
}

impl SourceRegistry {
    /// The registry of every built-in generator.
    #[must_use]
    pub fn builtin() -> Self {
        let plugins: [Box<dyn RequirementsGenerator>; 2] =
            [Box::new(markdown::Markdown), Box::new(csv::Csv)];
        Self {
            plugins: plugins.into_iter().map(|p| (p.name(), p)).collect(),
        }
    }

    /// Looks up a generator by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn RequirementsGenerator> {
        self.plugins.get(name).map(AsRef::as_ref)
    }

    /// Every generator, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &dyn RequirementsGenerator> {
        self.plugins.values().map(AsRef::as_ref)
    }
}

impl std::fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.plugins.keys()).finish()
    }
}

/// Runs a generator over its source directory and writes the result.
///
/// Returns the path of the written requirement file and the number of
/// requirements in it. Records are written in identifier order.
///
/// # Errors
///
/// Returns an error if the source directory is missing, the generator fails,
/// it yields duplicate identifiers, or the output cannot be written.
#[instrument(level = "debug", skip(plugin), fields(plugin = plugin.name()))]
pub fn run(plugin: &dyn RequirementsGenerator, paths: &Paths) -> Result<(PathBuf, usize), PluginError> {
    let input = paths.sources().join(plugin.name());
    if !input.is_dir() {
        return Err(PluginError::MissingInput(input));
    }

    let store = RequirementStore::try_from(plugin.generate(&input)?)?;
    let records: Vec<Requirement> = store.iter().cloned().collect();

    let output = paths.requirements().join(format!("{}.yaml", plugin.name()));
    requirements::write(&output, &records).map_err(|source| PluginError::Io {
        path: output.clone(),
        source,
    })?;

    tracing::debug!("{}: wrote {} requirements", plugin.name(), records.len());
    Ok((output, records.len()))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn registry_lists_builtin_sources() {
        let registry = SourceRegistry::builtin();
        let names: Vec<&str> = registry.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["csv", "markdown"]);
        assert!(registry.get("markdown").is_some());
        assert!(registry.get("jira").is_none());
    }

    #[test]
    fn run_writes_requirement_file() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = Paths::new(tmp.path().to_path_buf());
        let input = paths.sources().join("csv");
        fs::create_dir_all(&input).unwrap();
        fs::write(input.join("reqs.csv"), "id,title\nR2,Logout\nR1,Login\n").unwrap();

        let registry = SourceRegistry::builtin();
        let (path, count) = run(registry.get("csv").unwrap(), &paths).unwrap();

        assert_eq!(path, paths.requirements().join("csv.yaml"));
        assert_eq!(count, 2);
        let store = requirements::load(&paths.requirements()).unwrap();
        let ids: Vec<&str> = store.iter().map(|r| r.id().as_str()).collect();
        assert_eq!(ids, vec!["R1", "R2"]);
    }

    #[test]
    fn run_without_input_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = Paths::new(tmp.path().to_path_buf());
        let registry = SourceRegistry::builtin();

        let error = run(registry.get("markdown").unwrap(), &paths).unwrap_err();
        assert!(matches!(error, PluginError::MissingInput(_)));
    }

    #[test]
    fn run_rejects_duplicate_ids() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = Paths::new(tmp.path().to_path_buf());
        let input = paths.sources().join("csv");
        fs::create_dir_all(&input).unwrap();
        fs::write(input.join("a.csv"), "id\nR1\n").unwrap();
        fs::write(input.join("b.csv"), "id\nR1\n").unwrap();

        let registry = SourceRegistry::builtin();
        let error = run(registry.get("csv").unwrap(), &paths).unwrap_err();
        assert!(matches!(error, PluginError::Duplicate(_)));
        assert!(!paths.requirements().join("csv.yaml").exists());
    }
}
