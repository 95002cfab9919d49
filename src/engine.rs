//! The test-case generation engine.
//!
//! Generation is a pure pipeline over in-memory data:
//!
//! 1. every [`GenerationSet`] is expanded by the [`generator`], with its
//!    filters applied by the [`evaluator`] while assignments are built;
//! 2. the outputs are concatenated in set order and [`dedup::merge`]d by
//!    identity key;
//! 3. the result is put in canonical order by [`sort::sort`].
//!
//! Sets are independent of one another, so they are expanded in parallel.

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use tracing::instrument;

use crate::domain::{Config, GenerationSet, RequirementStore, TestCase};

/// Merging test cases by identity.
pub mod dedup;
/// Filter evaluation over partial assignments.
pub mod evaluator;
/// Expansion of one generation set.
pub mod generator;
mod pairwise;
/// The canonical order of test cases.
pub mod sort;

pub use generator::{CoverageGap, SetOutput, generate};

/// What one generation set contributed to a run.
#[derive(Debug, Clone)]
pub struct SetReport {
    /// The set's label.
    pub set: String,
    /// Valid candidates before the case cap.
    pub candidates: usize,
    /// Cases the set contributed, before deduplication.
    pub emitted: usize,
    /// Requirements in scope that received no cases.
    pub gaps: Vec<CoverageGap>,
}

impl SetReport {
    /// The number of candidates dropped by the case cap.
    #[must_use]
    pub const fn truncated(&self) -> usize {
        self.candidates - self.emitted
    }
}

/// The outcome of a generation run.
#[derive(Debug, Clone)]
pub struct Generation {
    /// The deduplicated test cases, in canonical order.
    pub cases: Vec<TestCase>,
    /// One report per generation set, in declaration order.
    pub reports: Vec<SetReport>,
}

/// Generates the test cases for every set in the configuration.
///
/// The returned collection contains no two test cases with equal identity
/// keys, and its order depends only on its contents.
#[instrument(level = "debug", skip_all, fields(sets = config.sets.len(), requirements = requirements.len()))]
pub fn run(requirements: &RequirementStore, config: &Config) -> Generation {
    let outputs: Vec<SetOutput> = config
        .sets
        .par_iter()
        .map(|set: &GenerationSet| generate(requirements, set, set.options(config.generation)))
        .collect();

    let reports: Vec<SetReport> = config
        .sets
        .iter()
        .zip(&outputs)
        .enumerate()
        .map(|(index, (set, output))| SetReport {
            set: set.label(index),
            candidates: output.candidates,
            emitted: output.cases.len(),
            gaps: output.gaps.clone(),
        })
        .collect();

    for report in &reports {
        if report.truncated() > 0 {
            tracing::warn!(
                "{}: case cap reached, kept {} of {} cases",
                report.set,
                report.emitted,
                report.candidates
            );
        }
        tracing::info!("{}: generated {} cases", report.set, report.emitted);
    }

    let emitted: usize = reports.iter().map(|r| r.emitted).sum();
    let cases = sort::sort(dedup::merge(outputs.into_iter().map(|o| o.cases)));
    tracing::debug!(
        "merged {emitted} cases into {} unique test cases",
        cases.len()
    );

    Generation { cases, reports }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Requirement, RequirementId};

    fn store() -> RequirementStore {
        RequirementStore::try_from(vec![
            Requirement::new(RequirementId::new("R1").unwrap()).with_tag("ui"),
            Requirement::new(RequirementId::new("R2").unwrap()).with_tag("api"),
        ])
        .unwrap()
    }

    const TWO_SETS: &str = r#"
_version = "1"

[[sets]]
name = "browsers"
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

[[sets]]
name = "smoke"

[[sets.dimensions]]
name = "Locale"
values = ["en"]

[[sets.dimensions]]
name = "Browser"
values = ["chrome"]
"#;

    fn rendered(cases: &[TestCase]) -> Vec<String> {
        cases.iter().map(|c| c.identity_key().to_string()).collect()
    }

    #[test]
    fn merges_sorts_and_deduplicates_across_sets() {
        let config: Config = TWO_SETS.parse().unwrap();
        let generation = run(&store(), &config);

        assert_eq!(
            rendered(&generation.cases),
            vec![
                "R1[Browser=chrome,Locale=en]",
                "R1[Browser=chrome,Locale=fr]",
                "R1[Browser=firefox,Locale=en]",
                "R2[Browser=chrome,Locale=en]",
            ]
        );
        assert_eq!(generation.reports.len(), 2);
        assert_eq!(generation.reports[0].emitted, 3);
        assert_eq!(generation.reports[1].emitted, 2);
    }

    #[test]
    fn independent_of_set_order() {
        let config: Config = TWO_SETS.parse().unwrap();
        let mut reversed = config.clone();
        reversed.sets.reverse();

        assert_eq!(run(&store(), &config).cases, run(&store(), &reversed).cases);
    }

    const REORDERED_VALUES: &str = r#"
_version = "1"

[[sets]]
name = "forward"

[[sets.dimensions]]
name = "Browser"
values = ["chrome", "firefox"]

[[sets]]
name = "backward"

[[sets.dimensions]]
name = "Browser"
values = ["firefox", "chrome"]
"#;

    #[test]
    fn shared_values_declared_in_different_orders() {
        let config: Config = REORDERED_VALUES.parse().unwrap();
        let mut reversed = config.clone();
        reversed.sets.reverse();

        let forward = run(&store(), &config).cases;
        let backward = run(&store(), &reversed).cases;
        assert_eq!(forward, backward);

        assert_eq!(
            rendered(&forward),
            vec![
                "R1[Browser=chrome]",
                "R1[Browser=firefox]",
                "R2[Browser=chrome]",
                "R2[Browser=firefox]",
            ]
        );
        assert!(
            forward
                .iter()
                .all(|case| case.assignment()[0].position == 0)
        );
    }

    #[test]
    fn deterministic_across_runs() {
        let config: Config = TWO_SETS.parse().unwrap();
        assert_eq!(run(&store(), &config).cases, run(&store(), &config).cases);
    }
}
