use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::instrument;

use crate::{
    domain::{
        Assignment, DomainValue, GenerationOptions, GenerationSet, Requirement, RequirementId,
        RequirementStore, Strategy, TestCase,
    },
    engine::{evaluator::Evaluator, pairwise, sort},
};

/// A dimension restricted to the values applicable to one requirement.
#[derive(Debug, Clone)]
pub(crate) struct Axis<'a> {
    pub(crate) name: &'a str,
    pub(crate) values: Vec<DomainValue<'a>>,
}

/// A choice of value index for each axis, in axis order.
pub(crate) type Choice = Vec<usize>;

/// A requirement with no applicable value for some dimension.
///
/// Not an error: the requirement simply gets no test cases from the set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageGap {
    /// The requirement left uncovered.
    pub requirement: RequirementId,
    /// The first dimension with an empty restricted domain.
    pub dimension: String,
}

/// The test cases one generation set contributes, and what happened on the
/// way.
#[derive(Debug, Clone, Default)]
pub struct SetOutput {
    /// The retained test cases.
    pub cases: Vec<TestCase>,
    /// The number of valid candidates before the case cap was applied.
    pub candidates: usize,
    /// Requirements in scope that received no test cases.
    pub gaps: Vec<CoverageGap>,
}

impl SetOutput {
    /// The number of valid candidates dropped by the case cap.
    #[must_use]
    pub fn truncated(&self) -> usize {
        self.candidates - self.cases.len()
    }
}

/// Expands one generation set into test cases.
///
/// For every requirement in the set's scope, each dimension is restricted to
/// the values that apply to the requirement. The restricted domains are then
/// expanded according to the strategy, with partial assignments pruned by
/// the set's filters as they are built.
///
/// If the set would produce more than `max_cases` test cases, its candidates
/// are put in the final sort order and the first `max_cases` are kept (or,
/// for [`Strategy::Sample`], `max_cases` are drawn with the seeded RNG).
#[instrument(level = "debug", skip_all, fields(dimensions = set.dimensions.len()))]
pub fn generate(
    requirements: &RequirementStore,
    set: &GenerationSet,
    options: GenerationOptions,
) -> SetOutput {
    let evaluator = Evaluator::new(&set.filters);
    let mut cases = Vec::new();
    let mut gaps = Vec::new();

    for requirement in requirements.iter().filter(|r| set.scope.matches(r)) {
        let axes: Vec<Axis<'_>> = set
            .dimensions
            .iter()
            .map(|dimension| Axis {
                name: &dimension.name,
                values: dimension.restrict(requirement),
            })
            .collect();

        if let Some(empty) = axes.iter().find(|axis| axis.values.is_empty()) {
            tracing::debug!(
                "{} has no applicable values for dimension '{}'",
                requirement.id(),
                empty.name
            );
            gaps.push(CoverageGap {
                requirement: requirement.id().clone(),
                dimension: empty.name.to_string(),
            });
            continue;
        }

        let choices = match options.strategy {
            Strategy::Full | Strategy::Sample => full_product(&axes, requirement, evaluator),
            Strategy::Pairwise => pairwise::cover(&axes, requirement, evaluator),
        };

        if choices.is_empty() {
            tracing::debug!("every combination for {} was filtered out", requirement.id());
        }

        cases.extend(
            choices
                .into_iter()
                .map(|choice| to_test_case(requirement, &axes, &choice)),
        );
    }

    let candidates = cases.len();
    let cases = match options.max_cases {
        Some(max) if candidates > max => {
            let sorted = sort::sort(cases);
            match (options.strategy, options.seed) {
                (Strategy::Sample, Some(seed)) => sample(sorted, max, seed),
                _ => sorted.into_iter().take(max).collect(),
            }
        }
        _ => cases,
    };

    SetOutput {
        cases,
        candidates,
        gaps,
    }
}

/// Every combination of axis values the filters accept, in declaration
/// order.
pub(crate) fn full_product(
    axes: &[Axis<'_>],
    requirement: &Requirement,
    evaluator: Evaluator<'_>,
) -> Vec<Choice> {
    let mut search = Search {
        axes,
        requirement,
        evaluator,
        partial: Vec::with_capacity(axes.len()),
        choice: Vec::with_capacity(axes.len()),
        out: Vec::new(),
    };
    search.expand();
    search.out
}

struct Search<'a> {
    axes: &'a [Axis<'a>],
    requirement: &'a Requirement,
    evaluator: Evaluator<'a>,
    partial: Vec<(&'a str, &'a str)>,
    choice: Choice,
    out: Vec<Choice>,
}

impl Search<'_> {
    fn expand(&mut self) {
        let axes = self.axes;
        let Some(axis) = axes.get(self.choice.len()) else {
            if self.evaluator.accepts(&self.partial, self.requirement) {
                self.out.push(self.choice.clone());
            }
            return;
        };

        for (index, value) in axis.values.iter().enumerate() {
            self.partial.push((axis.name, value.value));
            self.choice.push(index);
            if self.evaluator.accepts(&self.partial, self.requirement) {
                self.expand();
            }
            self.partial.pop();
            self.choice.pop();
        }
    }
}

fn to_test_case(requirement: &Requirement, axes: &[Axis<'_>], choice: &[usize]) -> TestCase {
    let assignment = axes
        .iter()
        .zip(choice)
        .map(|(axis, &index)| {
            let value = axis.values[index];
            Assignment::new(axis.name, value.value, value.position)
        })
        .collect();
    TestCase::new(
        requirement.id().clone(),
        requirement.title().map(ToString::to_string),
        assignment,
    )
}

/// Draws `amount` cases with a seeded RNG, returned in their original
/// (sorted) relative order.
fn sample(cases: Vec<TestCase>, amount: usize, seed: u64) -> Vec<TestCase> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut picked = rand::seq::index::sample(&mut rng, cases.len(), amount).into_vec();
    picked.sort_unstable();

    let mut picked = picked.into_iter().peekable();
    cases
        .into_iter()
        .enumerate()
        .filter_map(|(index, case)| {
            if picked.peek() == Some(&index) {
                picked.next();
                Some(case)
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Dimension, Filter};

    fn store(ids: &[&str]) -> RequirementStore {
        RequirementStore::try_from(
            ids.iter()
                .map(|id| Requirement::new(RequirementId::new(*id).unwrap()))
                .collect::<Vec<_>>(),
        )
        .unwrap()
    }

    fn browsers_and_locales() -> GenerationSet {
        GenerationSet {
            dimensions: vec![
                Dimension::new("Browser", ["chrome", "firefox"]),
                Dimension::new("Locale", ["en", "fr"]),
            ],
            ..GenerationSet::default()
        }
    }

    fn exclude_firefox_fr() -> Filter {
        toml::from_str("kind = \"exclude\"\nmatches = { Browser = \"firefox\", Locale = \"fr\" }\n")
            .unwrap()
    }

    fn pairs(cases: &[TestCase]) -> Vec<(String, String)> {
        cases
            .iter()
            .map(|c| {
                (
                    c.value_of("Browser").unwrap().to_string(),
                    c.value_of("Locale").unwrap().to_string(),
                )
            })
            .collect()
    }

    fn pair(browser: &str, locale: &str) -> (String, String) {
        (browser.to_string(), locale.to_string())
    }

    #[test]
    fn full_product_in_domain_order() {
        let output = generate(
            &store(&["R1"]),
            &browsers_and_locales(),
            GenerationOptions::default(),
        );
        assert_eq!(
            pairs(&output.cases),
            vec![
                pair("chrome", "en"),
                pair("chrome", "fr"),
                pair("firefox", "en"),
                pair("firefox", "fr"),
            ]
        );
        assert_eq!(output.candidates, 4);
        assert_eq!(output.truncated(), 0);
    }

    #[test]
    fn filters_prune_combinations() {
        let mut set = browsers_and_locales();
        set.filters.push(exclude_firefox_fr());

        let output = generate(&store(&["R1"]), &set, GenerationOptions::default());
        assert_eq!(
            pairs(&output.cases),
            vec![
                pair("chrome", "en"),
                pair("chrome", "fr"),
                pair("firefox", "en"),
            ]
        );
    }

    #[test]
    fn every_case_assigns_every_dimension() {
        let mut set = browsers_and_locales();
        set.dimensions.push(Dimension::new("Os", ["linux", "mac", "windows"]));
        let output = generate(&store(&["R1", "R2"]), &set, GenerationOptions::default());
        assert_eq!(output.cases.len(), 24);
        assert!(output.cases.iter().all(|c| c.assignment().len() == 3));
    }

    #[test]
    fn zero_dimensions_yield_one_case_per_requirement() {
        let output = generate(
            &store(&["R1", "R2"]),
            &GenerationSet::default(),
            GenerationOptions::default(),
        );
        assert_eq!(output.cases.len(), 2);
        assert!(output.cases.iter().all(|c| c.assignment().is_empty()));
    }

    #[test]
    fn empty_restricted_domain_is_a_gap() {
        let mut set = browsers_and_locales();
        set.dimensions.push(
            toml::from_str(
                "name = \"Os\"\nvalues = [{ value = \"mac\", applies_to = { tags = [\"mac\"] } }]\n",
            )
            .unwrap(),
        );
        let output = generate(&store(&["R1"]), &set, GenerationOptions::default());
        assert!(output.cases.is_empty());
        assert_eq!(
            output.gaps,
            vec![CoverageGap {
                requirement: RequirementId::new("R1").unwrap(),
                dimension: "Os".to_string(),
            }]
        );
    }

    #[test]
    fn scope_limits_requirements() {
        let mut set = browsers_and_locales();
        set.scope.ids = vec![RequirementId::new("R2").unwrap()];
        let output = generate(&store(&["R1", "R2"]), &set, GenerationOptions::default());
        assert!(output.cases.iter().all(|c| c.requirement().as_str() == "R2"));
        assert_eq!(output.cases.len(), 4);
    }

    #[test]
    fn cap_keeps_first_cases_in_sort_order() {
        let options = GenerationOptions {
            max_cases: Some(3),
            ..GenerationOptions::default()
        };
        let output = generate(&store(&["R2", "R1"]), &browsers_and_locales(), options);
        assert_eq!(output.cases.len(), 3);
        assert_eq!(output.candidates, 8);
        assert_eq!(output.truncated(), 5);
        assert!(output.cases.iter().all(|c| c.requirement().as_str() == "R1"));
        assert_eq!(
            pairs(&output.cases),
            vec![
                pair("chrome", "en"),
                pair("chrome", "fr"),
                pair("firefox", "en"),
            ]
        );
    }

    #[test]
    fn sample_is_stable_for_a_seed() {
        let options = GenerationOptions {
            strategy: Strategy::Sample,
            max_cases: Some(5),
            seed: Some(42),
        };
        let mut set = browsers_and_locales();
        set.dimensions.push(Dimension::new("Os", ["linux", "mac", "windows"]));

        let first = generate(&store(&["R1"]), &set, options);
        let second = generate(&store(&["R1"]), &set, options);

        assert_eq!(first.cases.len(), 5);
        assert_eq!(first.candidates, 12);
        assert_eq!(first.cases, second.cases);
        assert_eq!(sort::sort(first.cases.clone()), first.cases);
    }

    #[test]
    fn sample_without_cap_is_full_product() {
        let options = GenerationOptions {
            strategy: Strategy::Sample,
            max_cases: None,
            seed: Some(1),
        };
        let output = generate(&store(&["R1"]), &browsers_and_locales(), options);
        assert_eq!(output.cases.len(), 4);
    }
}
