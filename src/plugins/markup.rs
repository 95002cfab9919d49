//! Rendering test cases to human-readable markup.
//!
//! Each format is a [`MarkupPlugin`] registered under its name in the
//! [`MarkupRegistry`]. The format name doubles as the file extension of
//! rendered files.

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use tracing::instrument;

use crate::{
    domain::{IdentityKey, TestCase},
    storage::test_cases::file_name,
};

mod html;
mod json;
mod markdown;

/// The format used when none is given.
pub const DEFAULT_FORMAT: &str = "md";

/// Errors raised while rendering or writing one test case.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The test case could not be encoded as JSON.
    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The rendered text could not be written.
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        /// The file being written.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },
}

/// Renders one test case to text in a target format.
///
/// Rendering must depend only on the given test case, so that cases can be
/// rendered concurrently and a failure on one never affects another.
pub trait MarkupPlugin: Send + Sync {
    /// The format name, also used as the file extension.
    fn name(&self) -> &'static str;

    /// Renders the test case.
    ///
    /// # Errors
    ///
    /// Returns an error if the case cannot be represented in the format.
    fn render(&self, case: &TestCase) -> Result<String, RenderError>;
}

/// The fixed set of markup plugins, keyed by format name.
pub struct MarkupRegistry {
    plugins: BTreeMap<&'static str, Box<dyn MarkupPlugin>>,
}

impl MarkupRegistry {
    /// The registry of every built-in format.
    #[must_use]
    pub fn builtin() -> Self {
        let plugins: [Box<dyn MarkupPlugin>; 3] = [
            Box::new(markdown::Markdown),
            Box::new(html::Html),
            Box::new(json::Json),
        ];
        Self {
            plugins: plugins.into_iter().map(|p| (p.name(), p)).collect(),
        }
    }

    /// Looks up a plugin by format name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn MarkupPlugin> {
        self.plugins.get(name).map(AsRef::as_ref)
    }

    /// The registered format names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.plugins.keys().copied()
    }
}

impl std::fmt::Debug for MarkupRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// The outcome of rendering one test case.
#[derive(Debug)]
pub struct Rendered<'a> {
    /// The test case.
    pub case: &'a TestCase,
    /// The rendered text, or why rendering failed.
    pub result: Result<String, RenderError>,
}

/// Renders every test case concurrently.
///
/// Returns once every case has an outcome, in the order of `cases`.
/// Failures are per case.
pub fn render_all<'a>(plugin: &dyn MarkupPlugin, cases: &'a [TestCase]) -> Vec<Rendered<'a>> {
    cases
        .par_iter()
        .map(|case| Rendered {
            case,
            result: plugin.render(case),
        })
        .collect()
}

/// A test case that could not be rendered or written.
#[derive(Debug)]
pub struct RenderFailure {
    /// The test case.
    pub case: IdentityKey,
    /// What went wrong.
    pub error: RenderError,
}

/// The outcome of rendering test cases to a directory.
#[derive(Debug, Default)]
pub struct RenderReport {
    /// The files written, in the order of the input cases.
    pub written: Vec<PathBuf>,
    /// The cases that failed.
    pub failures: Vec<RenderFailure>,
}

/// Renders every test case and writes it to `dir` as
/// `<file name>.<format>`.
///
/// Cases are rendered and written concurrently. `on_done` is called once per
/// case as it finishes. The function returns only once every case has been
/// attempted; the directory must already exist and have been cleared by the
/// caller.
#[instrument(level = "debug", skip(plugin, cases, on_done), fields(format = plugin.name(), cases = cases.len()))]
pub fn render_to_dir<F>(
    plugin: &dyn MarkupPlugin,
    cases: &[TestCase],
    dir: &Path,
    on_done: F,
) -> RenderReport
where
    F: Fn() + Sync,
{
    let outcomes: Vec<(&TestCase, Result<PathBuf, RenderError>)> = cases
        .par_iter()
        .map(|case| {
            let outcome = plugin.render(case).and_then(|text| {
                let path = dir.join(format!("{}.{}", file_name(case), plugin.name()));
                fs::write(&path, text)
                    .map(|()| path.clone())
                    .map_err(|source| RenderError::Io { path, source })
            });
            on_done();
            (case, outcome)
        })
        .collect();

    let mut report = RenderReport::default();
    for (case, outcome) in outcomes {
        match outcome {
            Ok(path) => report.written.push(path),
            Err(error) => {
                tracing::warn!("failed to render {}: {error}", case.identity_key());
                report.failures.push(RenderFailure {
                    case: case.identity_key(),
                    error,
                });
            }
        }
    }
    report
}
