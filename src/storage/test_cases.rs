//! Persisting generated test cases.
//!
//! Each test case is saved to its own YAML file. The file name is derived
//! from the case's identity key, so the same case always lands in the same
//! file and distinct cases never share one.

use std::{
    collections::HashMap,
    fmt::Write as _,
    fs, io,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use rayon::iter::{IntoParallelIterator, IntoParallelRefIterator, ParallelIterator};
use regex::Regex;
use tracing::instrument;
use walkdir::WalkDir;

use crate::{
    domain::{IdentityKey, TestCase},
    engine::sort,
};

/// Number of hex digits of the identity digest used in file names.
const DIGEST_LEN: usize = 16;

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_.-]+").expect("valid regex"));

/// The file name (without extension) a test case is saved under.
///
/// The sanitised requirement identifier keeps directory listings readable;
/// the digest of the identity key keeps names distinct.
#[must_use]
pub fn file_name(case: &TestCase) -> String {
    let key = case.identity_key();
    let id = UNSAFE_CHARS.replace_all(key.requirement().as_str(), "_");
    let digest = key.digest();
    format!("{id}-{}", &digest[..DIGEST_LEN])
}

/// Errors that can occur when saving test cases.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    /// Two distinct test cases map to the same file name.
    #[error("test cases {first} and {second} map to the same file name '{name}'")]
    Collision {
        /// The shared file name.
        name: String,
        /// The first test case.
        first: IdentityKey,
        /// The second test case.
        second: IdentityKey,
    },

    /// A file could not be written.
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        /// The file being written.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// A test case could not be serialised.
    #[error("failed to serialise test case: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Errors that can occur when loading saved test cases.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// The file being read.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// A file does not hold a valid test case.
    #[error("failed to parse {}: {source}", .path.display())]
    Yaml {
        /// The file being parsed.
        path: PathBuf,
        /// The underlying error.
        source: serde_yaml::Error,
    },
}

/// Writes one YAML file per test case into `dir`.
///
/// The directory is created if needed. Callers that want a clean directory
/// must clear it before calling this.
///
/// # Errors
///
/// Fails before writing anything if two cases would share a file name, and
/// otherwise on the first file that cannot be written.
#[instrument(level = "debug", skip(cases), fields(cases = cases.len()))]
pub fn save(cases: &[TestCase], dir: &Path) -> Result<Vec<PathBuf>, SaveError> {
    let mut names: HashMap<String, &TestCase> = HashMap::with_capacity(cases.len());
    let mut planned = Vec::with_capacity(cases.len());
    for case in cases {
        let name = file_name(case);
        if let Some(other) = names.insert(name.clone(), case) {
            return Err(SaveError::Collision {
                name,
                first: other.identity_key(),
                second: case.identity_key(),
            });
        }
        planned.push((dir.join(format!("{name}.yaml")), case));
    }

    fs::create_dir_all(dir).map_err(|source| SaveError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    planned.par_iter().try_for_each(|(path, case)| {
        let yaml = serde_yaml::to_string(case)?;
        fs::write(path, yaml).map_err(|source| SaveError::Io {
            path: path.clone(),
            source,
        })
    })?;

    Ok(planned.into_iter().map(|(path, _)| path).collect())
}

/// Loads every saved test case in `dir`, in canonical order.
///
/// # Errors
///
/// Returns an error if a file cannot be read or parsed.
#[instrument(level = "debug")]
pub fn load(dir: &Path) -> Result<Vec<TestCase>, LoadError> {
    let paths: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| path.extension().is_some_and(|ext| ext == "yaml"))
        .collect();

    let cases = paths
        .into_par_iter()
        .map(|path| {
            let content = fs::read_to_string(&path).map_err(|source| LoadError::Io {
                path: path.clone(),
                source,
            })?;
            serde_yaml::from_str::<TestCase>(&content)
                .map_err(|source| LoadError::Yaml { path, source })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(sort::sort(cases))
}

/// Renders a plain-text summary of test cases, grouped by requirement.
///
/// Used for dry runs in place of saving.
#[must_use]
pub fn summary(cases: &[TestCase]) -> String {
    let mut out = String::new();
    let mut requirements = 0;
    let mut current = None;
    let mut index = 0;

    for case in cases {
        if current != Some(case.requirement()) {
            if current.is_some() {
                out.push('\n');
            }
            current = Some(case.requirement());
            requirements += 1;
            index = 0;
            match case.summary() {
                Some(title) => writeln!(out, "{} {title}", case.requirement()),
                None => writeln!(out, "{}", case.requirement()),
            }
            .expect("writing to a String never fails");
        }
        index += 1;
        let assignment = if case.assignment().is_empty() {
            "(no dimensions)".to_string()
        } else {
            case.assignment()
                .iter()
                .map(|a| format!("{}={}", a.dimension, a.value))
                .collect::<Vec<_>>()
                .join(", ")
        };
        writeln!(out, "  {index}. {assignment}").expect("writing to a String never fails");
    }

    if !cases.is_empty() {
        out.push('\n');
    }
    let plural = |n: usize| if n == 1 { "" } else { "s" };
    write!(
        out,
        "{} test case{} for {requirements} requirement{}",
        cases.len(),
        plural(cases.len()),
        plural(requirements)
    )
    .expect("writing to a String never fails");
    out
}
