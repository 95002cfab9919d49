//! Loading and writing requirement files.
//!
//! A requirement file is a YAML sequence of requirement records. Every
//! `*.yaml` or `*.yml` file under the requirements directory is loaded.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use tracing::instrument;
use walkdir::WalkDir;

use crate::domain::{DuplicateIdError, Requirement, RequirementStore};

/// Errors that can occur when loading requirements.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The requirements directory does not exist.
    #[error("requirements directory {} does not exist", .0.display())]
    MissingDirectory(PathBuf),

    /// A requirement file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// The file being read.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// A requirement file is not a valid sequence of requirements.
    #[error("failed to parse {}: {source}", .path.display())]
    Yaml {
        /// The file being parsed.
        path: PathBuf,
        /// The underlying error.
        source: serde_yaml::Error,
    },

    /// Two records share an identifier.
    #[error(transparent)]
    Duplicate(#[from] DuplicateIdError),
}

/// Loads every requirement file under `dir` into a store.
///
/// # Errors
///
/// Loading is all-or-nothing: a missing directory, an unreadable or
/// malformed file, or a duplicate identifier (within or across files) fails
/// the whole load.
#[instrument(level = "debug")]
pub fn load(dir: &Path) -> Result<RequirementStore, LoadError> {
    if !dir.is_dir() {
        return Err(LoadError::MissingDirectory(dir.to_path_buf()));
    }

    let paths = collect_yaml_paths(dir);
    let files: Vec<Vec<Requirement>> = paths
        .par_iter()
        .map(|path| read_file(path))
        .collect::<Result<_, _>>()?;

    let mut store = RequirementStore::new();
    for requirement in files.into_iter().flatten() {
        store.insert(requirement)?;
    }

    tracing::debug!(
        "loaded {} requirements from {} files",
        store.len(),
        paths.len()
    );
    Ok(store)
}

/// Writes requirements to a single requirement file, replacing it.
///
/// Parent directories are created automatically if they don't exist.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
pub fn write(path: &Path, requirements: &[Requirement]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_yaml::to_writer(&mut writer, requirements).map_err(io::Error::other)?;
    writer.flush()
}

fn read_file(path: &Path) -> Result<Vec<Requirement>, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    // an empty file holds no requirements
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_yaml::from_str(&content).map_err(|source| LoadError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}

fn collect_yaml_paths(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| {
            entry
                .map_err(|e| tracing::warn!("skipping unreadable entry: {e}"))
                .ok()
        })
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == "yaml" || ext == "yml")
        })
        .collect()
}
