//! The on-disk layout of a project.
//!
//! Every path the tool reads or writes is derived from a [`Paths`] value
//! built from the project root. Nothing in the generation engine reads these
//! paths; they are threaded explicitly into its callers.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// The name of the configuration file in the project root.
pub const CONFIG_FILE: &str = "testgen.toml";

/// Paths to the inputs and outputs of a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    root: PathBuf,
}

impl Paths {
    /// Creates the layout for the project rooted at `root`.
    #[must_use]
    pub const fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// The project root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The generation configuration file.
    #[must_use]
    pub fn config(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    /// Inputs for the requirements-generator plugins.
    ///
    /// Each plugin reads from its own subdirectory, named after the plugin.
    #[must_use]
    pub fn sources(&self) -> PathBuf {
        self.root.join("sources")
    }

    /// Everything the tool generates. Removed by `clear`.
    #[must_use]
    pub fn output(&self) -> PathBuf {
        self.root.join("generated")
    }

    /// Requirement files produced by the requirements-generator plugins.
    #[must_use]
    pub fn requirements(&self) -> PathBuf {
        self.output().join("requirements")
    }

    /// Saved test cases, one file per case.
    #[must_use]
    pub fn test_cases(&self) -> PathBuf {
        self.output().join("test-cases")
    }

    /// Test cases rendered by a markup plugin.
    #[must_use]
    pub fn rendered(&self) -> PathBuf {
        self.output().join("test-cases-rendered")
    }

    /// Creates the output directories if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created.
    pub fn setup_output(&self) -> io::Result<()> {
        for dir in [self.requirements(), self.test_cases(), self.rendered()] {
            fs::create_dir_all(&dir)?;
        }
        Ok(())
    }

    /// Removes the whole output directory.
    ///
    /// Succeeds if it is already absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be removed.
    pub fn remove_output(&self) -> io::Result<()> {
        match fs::remove_dir_all(self.output()) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

/// Empties a directory, creating it if it doesn't exist.
///
/// Returns only once every entry has been removed, so writes issued after it
/// never race the removal.
///
/// # Errors
///
/// Returns an error if an entry cannot be removed or the directory cannot be
/// created.
pub fn clear_directory(dir: &Path) -> io::Result<()> {
    if dir.exists() {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                fs::remove_dir_all(&path)?;
            } else {
                fs::remove_file(&path)?;
            }
        }
        tracing::debug!("cleared {}", dir.display());
    } else {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}
