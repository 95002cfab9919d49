use std::{collections::HashSet, path::Path};

use serde::{Deserialize, Serialize};

use crate::domain::{Dimension, Filter, RequirementId, Selector};

/// How a generation set's dimensions are expanded into test cases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Every combination of applicable values.
    #[default]
    Full,
    /// A covering array containing every pair of values across any two
    /// dimensions at least once.
    Pairwise,
    /// A seeded random sample of `max_cases` cases from the full product.
    Sample,
}

/// Global knobs controlling expansion.
///
/// A [`GenerationSet`] may override any of them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationOptions {
    /// The expansion strategy.
    #[serde(default)]
    pub strategy: Strategy,

    /// The maximum number of test cases a single set may contribute.
    #[serde(default, alias = "maxCases", skip_serializing_if = "Option::is_none")]
    pub max_cases: Option<usize>,

    /// Seed for the random number generator of sampling strategies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// A group of dimensions and filters applied to part of the requirement
/// space.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationSet {
    /// An optional name, used in log output and reports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// The requirements this set covers. Empty means all of them.
    #[serde(default, skip_serializing_if = "Selector::is_empty")]
    pub scope: Selector,

    /// The axes to expand, in declaration order.
    #[serde(default)]
    pub dimensions: Vec<Dimension>,

    /// Constraints every generated test case must satisfy.
    #[serde(default)]
    pub filters: Vec<Filter>,

    /// Overrides the global strategy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Strategy>,

    /// Overrides the global case cap.
    #[serde(default, alias = "maxCases", skip_serializing_if = "Option::is_none")]
    pub max_cases: Option<usize>,

    /// Overrides the global seed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl GenerationSet {
    /// The effective options for this set, given the global ones.
    #[must_use]
    pub fn options(&self, global: GenerationOptions) -> GenerationOptions {
        GenerationOptions {
            strategy: self.strategy.unwrap_or(global.strategy),
            max_cases: self.max_cases.or(global.max_cases),
            seed: self.seed.or(global.seed),
        }
    }

    /// A label for the set: its name, or its 1-based position.
    #[must_use]
    pub fn label(&self, index: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("set #{}", index + 1))
    }

    /// Looks up a dimension by name.
    #[must_use]
    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    /// Every selector in the set that can name requirements explicitly.
    fn selectors(&self) -> impl Iterator<Item = &Selector> {
        std::iter::once(&self.scope)
            .chain(
                self.dimensions
                    .iter()
                    .flat_map(|d| d.values.iter())
                    .filter_map(|v| v.applies_to.as_ref()),
            )
            .chain(self.filters.iter().filter_map(Filter::selector))
    }
}

/// Test-generation configuration.
///
/// Holds the global [`GenerationOptions`] and the list of
/// [`GenerationSet`]s whose outputs are merged into one collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Global generation options.
    pub generation: GenerationOptions,

    /// The generation sets, in declaration order.
    pub sets: Vec<GenerationSet>,
}

/// Errors raised while loading or validating the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// The path of the configuration file.
        path: String,
        /// The underlying error.
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML or does not match the schema.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Two dimensions in one set share a name.
    #[error("{set}: dimension '{dimension}' is declared more than once")]
    DuplicateDimension {
        /// The label of the offending set.
        set: String,
        /// The duplicated dimension name.
        dimension: String,
    },

    /// A dimension lists the same value twice.
    #[error("{set}: dimension '{dimension}' declares value '{value}' more than once")]
    DuplicateValue {
        /// The label of the offending set.
        set: String,
        /// The dimension name.
        dimension: String,
        /// The duplicated value.
        value: String,
    },

    /// A filter refers to a dimension the set does not declare.
    #[error("{set}: filter refers to undeclared dimension '{dimension}'")]
    UndeclaredDimension {
        /// The label of the offending set.
        set: String,
        /// The undeclared dimension name.
        dimension: String,
    },

    /// The sample strategy was selected without a seed.
    #[error("{set}: the 'sample' strategy requires a seed")]
    SampleWithoutSeed {
        /// The label of the offending set.
        set: String,
    },

    /// A selector names a requirement that does not exist.
    #[error("{set}: unknown requirement '{id}'")]
    DanglingRequirement {
        /// The label of the offending set.
        set: String,
        /// The unknown requirement identifier.
        id: RequirementId,
    },
}

impl Config {
    /// Loads and validates the configuration from a TOML file at the given
    /// path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, if the TOML content is
    /// invalid, or if the configuration is inconsistent (see
    /// [`Config::validate`]).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        content.parse()
    }

    /// Checks the internal consistency of the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first problem found: a duplicate dimension or value name
    /// within a set, a filter referring to an undeclared dimension, or the
    /// sample strategy without a seed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (index, set) in self.sets.iter().enumerate() {
            let label = || set.label(index);

            let mut names = HashSet::new();
            for dimension in &set.dimensions {
                if !names.insert(dimension.name.as_str()) {
                    return Err(ConfigError::DuplicateDimension {
                        set: label(),
                        dimension: dimension.name.clone(),
                    });
                }
                let mut values = HashSet::new();
                for value in &dimension.values {
                    if !values.insert(value.value.as_str()) {
                        return Err(ConfigError::DuplicateValue {
                            set: label(),
                            dimension: dimension.name.clone(),
                            value: value.value.clone(),
                        });
                    }
                }
            }

            for filter in &set.filters {
                for (dimension, value) in filter.references() {
                    let Some(declared) = set.dimension(dimension) else {
                        return Err(ConfigError::UndeclaredDimension {
                            set: label(),
                            dimension: dimension.to_string(),
                        });
                    };
                    if declared.position_of(value).is_none() {
                        tracing::warn!(
                            "{}: filter{} refers to value '{value}' which dimension '{dimension}' does not declare",
                            label(),
                            filter
                                .description()
                                .map(|d| format!(" '{d}'"))
                                .unwrap_or_default()
                        );
                    }
                }
            }

            let options = set.options(self.generation);
            if options.strategy == Strategy::Sample && options.seed.is_none() {
                return Err(ConfigError::SampleWithoutSeed { set: label() });
            }
        }
        Ok(())
    }

    /// Checks that every requirement named by a selector exists.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DanglingRequirement`] for the first unknown
    /// identifier.
    pub fn check_references<F>(&self, exists: F) -> Result<(), ConfigError>
    where
        F: Fn(&RequirementId) -> bool,
    {
        for (index, set) in self.sets.iter().enumerate() {
            for selector in set.selectors() {
                if let Some(id) = selector.ids.iter().find(|id| !exists(id)) {
                    return Err(ConfigError::DanglingRequirement {
                        set: set.label(index),
                        id: id.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl std::str::FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default)]
        generation: GenerationOptions,

        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        sets: Vec<GenerationSet>,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 { generation, sets } => Self { generation, sets },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            generation: config.generation,
            sets: config.sets,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const BROWSERS: &str = r#"
_version = "1"

[generation]
strategy = "pairwise"
max_cases = 10

[[sets]]
name = "web"
scope = { tags = ["ui"] }

[[sets.dimensions]]
name = "Browser"
values = ["chrome", "firefox"]

[[sets.dimensions]]
name = "Locale"
values = ["en", "fr"]

[[sets.filters]]
kind = "exclude"
matches = { Browser = "firefox", Locale = "fr" }
"#;

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(BROWSERS.as_bytes()).unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.generation.strategy, Strategy::Pairwise);
        assert_eq!(config.generation.max_cases, Some(10));
        assert_eq!(config.sets.len(), 1);
        assert_eq!(config.sets[0].dimensions.len(), 2);
        assert_eq!(config.sets[0].filters.len(), 1);
        assert!(config.sets[0].scope.tags.contains("ui"));
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        let error = Config::load(&missing).unwrap_err();
        assert!(matches!(error, ConfigError::Io { .. }));
    }

    #[test]
    fn empty_file_returns_default() {
        let expected = Config::default();
        let actual: Config = r#"_version = "1""#.parse().unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn camel_case_cap_is_accepted() {
        let config: Config = "_version = \"1\"\n[generation]\nmaxCases = 3\n"
            .parse()
            .unwrap();
        assert_eq!(config.generation.max_cases, Some(3));
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        let error = "_version = \"1\"\n[generation]\nstrategy = \"exhaustive\"\n"
            .parse::<Config>()
            .unwrap_err();
        assert!(matches!(error, ConfigError::Parse(_)));
    }

    #[test]
    fn filter_on_undeclared_dimension_is_rejected() {
        let toml = BROWSERS.replace("Locale = \"fr\"", "Os = \"mac\"");
        let error = toml.parse::<Config>().unwrap_err();
        assert!(
            matches!(error, ConfigError::UndeclaredDimension { ref dimension, .. } if dimension == "Os")
        );
    }

    #[test]
    fn filter_on_undeclared_value_only_warns() {
        let toml = BROWSERS.replace(
            "matches = { Browser = \"firefox\", Locale = \"fr\" }",
            "description = \"no German firefox\"\nmatches = { Browser = \"firefox\", Locale = \"de\" }",
        );
        let config: Config = toml.parse().unwrap();
        assert_eq!(
            config.sets[0].filters[0].description(),
            Some("no German firefox")
        );
    }

    #[test]
    fn duplicate_dimension_is_rejected() {
        let toml = BROWSERS.replace("name = \"Locale\"", "name = \"Browser\"");
        let error = toml.parse::<Config>().unwrap_err();
        assert!(matches!(error, ConfigError::DuplicateDimension { .. }));
    }

    #[test]
    fn duplicate_value_is_rejected() {
        let toml = BROWSERS.replace("[\"en\", \"fr\"]", "[\"en\", \"en\"]");
        let error = toml.parse::<Config>().unwrap_err();
        assert!(matches!(error, ConfigError::DuplicateValue { .. }));
    }

    #[test]
    fn sample_requires_seed() {
        let toml = BROWSERS.replace("\"pairwise\"", "\"sample\"");
        let error = toml.parse::<Config>().unwrap_err();
        assert!(matches!(error, ConfigError::SampleWithoutSeed { .. }));

        let seeded = toml.replace("max_cases = 10", "max_cases = 10\nseed = 7");
        assert!(seeded.parse::<Config>().is_ok());
    }

    #[test]
    fn set_overrides_global_options() {
        let toml = BROWSERS.replace("name = \"web\"", "name = \"web\"\nstrategy = \"full\"");
        let config: Config = toml.parse().unwrap();
        let options = config.sets[0].options(config.generation);
        assert_eq!(options.strategy, Strategy::Full);
        assert_eq!(options.max_cases, Some(10));
    }

    #[test]
    fn dangling_requirement_is_reported() {
        let toml = BROWSERS.replace("scope = { tags = [\"ui\"] }", "scope = { ids = [\"R9\"] }");
        let config: Config = toml.parse().unwrap();
        let error = config.check_references(|id| id.as_str() == "R1").unwrap_err();
        assert!(matches!(error, ConfigError::DanglingRequirement { ref id, .. } if id.as_str() == "R9"));
        assert!(config.check_references(|_| true).is_ok());
    }
}
