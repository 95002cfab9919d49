//! Greedy covering-array construction.
//!
//! Every feasible pair of values from any two dimensions appears in at least
//! one emitted case. A pair is feasible when some complete assignment
//! containing it passes the filters.
//!
//! The first uncovered pair (in dimension then value declaration order)
//! seeds each new case. The remaining dimensions are filled in declaration
//! order with the value that covers the most still-uncovered pairs, ties
//! going to the earliest declared value. Values the filters reject are
//! skipped, backtracking if a dimension runs out of values. A seed pair that
//! cannot be completed is dropped as infeasible.

use std::collections::BTreeSet;

use crate::{
    domain::Requirement,
    engine::{
        evaluator::Evaluator,
        generator::{Axis, Choice, full_product},
    },
};

/// `(first dimension, second dimension, first value, second value)`, with
/// `first dimension < second dimension`. Indices are into the restricted
/// axes and their value lists.
type Pair = (usize, usize, usize, usize);

/// Builds a covering array for one requirement.
pub(crate) fn cover(
    axes: &[Axis<'_>],
    requirement: &Requirement,
    evaluator: Evaluator<'_>,
) -> Vec<Choice> {
    // with fewer than two dimensions there are no pairs to share
    if axes.len() < 2 {
        return full_product(axes, requirement, evaluator);
    }

    let mut builder = Builder {
        axes,
        requirement,
        evaluator,
        uncovered: BTreeSet::new(),
    };
    builder.seed_pairs();

    let mut out = Vec::new();
    while let Some(&target) = builder.uncovered.first() {
        if let Some(choice) = builder.complete(target) {
            builder.mark_covered(&choice);
            out.push(choice);
        } else {
            tracing::trace!(?target, "pair cannot be completed, dropping");
            builder.uncovered.remove(&target);
        }
    }
    out
}

struct Builder<'a> {
    axes: &'a [Axis<'a>],
    requirement: &'a Requirement,
    evaluator: Evaluator<'a>,
    uncovered: BTreeSet<Pair>,
}

impl Builder<'_> {
    /// Collects every pair whose two values the filters accept together.
    fn seed_pairs(&mut self) {
        for (i, first) in self.axes.iter().enumerate() {
            for (j, second) in self.axes.iter().enumerate().skip(i + 1) {
                for (a, x) in first.values.iter().enumerate() {
                    for (b, y) in second.values.iter().enumerate() {
                        let partial = [(first.name, x.value), (second.name, y.value)];
                        if self.evaluator.accepts(&partial, self.requirement) {
                            self.uncovered.insert((i, j, a, b));
                        }
                    }
                }
            }
        }
    }

    fn mark_covered(&mut self, choice: &[usize]) {
        for i in 0..choice.len() {
            for j in i + 1..choice.len() {
                self.uncovered.remove(&(i, j, choice[i], choice[j]));
            }
        }
    }

    /// Number of uncovered pairs assigning `value` to `dimension` would cover
    /// against the dimensions already assigned in `slots`.
    fn gain(&self, slots: &[Option<usize>], dimension: usize, value: usize) -> usize {
        slots
            .iter()
            .enumerate()
            .filter_map(|(other, slot)| slot.map(|v| (other, v)))
            .filter(|&(other, other_value)| {
                let pair = if other < dimension {
                    (other, dimension, other_value, value)
                } else {
                    (dimension, other, value, other_value)
                };
                other != dimension && self.uncovered.contains(&pair)
            })
            .count()
    }

    fn partial(&self, slots: &[Option<usize>]) -> Vec<(&str, &str)> {
        self.axes
            .iter()
            .zip(slots)
            .filter_map(|(axis, slot)| slot.map(|index| (axis.name, axis.values[index].value)))
            .collect()
    }

    /// Extends the target pair to a complete assignment the filters accept.
    fn complete(&self, target: Pair) -> Option<Choice> {
        let (i, j, a, b) = target;
        let mut slots = vec![None; self.axes.len()];
        slots[i] = Some(a);
        slots[j] = Some(b);

        let order: Vec<usize> = (0..self.axes.len()).filter(|&d| d != i && d != j).collect();
        if self.fill(&order, &mut slots) {
            slots.into_iter().collect()
        } else {
            None
        }
    }

    fn fill(&self, order: &[usize], slots: &mut [Option<usize>]) -> bool {
        let Some((&dimension, rest)) = order.split_first() else {
            return self
                .evaluator
                .accepts(&self.partial(slots), self.requirement);
        };

        let mut candidates: Vec<(usize, usize)> = (0..self.axes[dimension].values.len())
            .map(|value| (self.gain(slots, dimension, value), value))
            .collect();
        // most new pairs first, then declaration order
        candidates.sort_by(|x, y| y.0.cmp(&x.0).then(x.1.cmp(&y.1)));

        for (_, value) in candidates {
            slots[dimension] = Some(value);
            if self
                .evaluator
                .accepts(&self.partial(slots), self.requirement)
                && self.fill(rest, slots)
            {
                return true;
            }
        }
        slots[dimension] = None;
        false
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::domain::{Dimension, Filter, RequirementId};

    fn requirement() -> Requirement {
        Requirement::new(RequirementId::new("R1").unwrap())
    }

    fn axes<'a>(dimensions: &'a [Dimension], requirement: &Requirement) -> Vec<Axis<'a>> {
        dimensions
            .iter()
            .map(|d| Axis {
                name: &d.name,
                values: d.restrict(requirement),
            })
            .collect()
    }

    /// Every pair present in the full product is present in the cover.
    fn assert_covers(axes: &[Axis<'_>], full: &[Choice], cover: &[Choice]) {
        let pairs_of = |choices: &[Choice]| -> HashSet<Pair> {
            let mut pairs = HashSet::new();
            for choice in choices {
                for i in 0..axes.len() {
                    for j in i + 1..axes.len() {
                        pairs.insert((i, j, choice[i], choice[j]));
                    }
                }
            }
            pairs
        };
        assert_eq!(pairs_of(full), pairs_of(cover));
    }

    #[test]
    fn three_binary_dimensions_need_four_cases() {
        let dimensions = vec![
            Dimension::new("A", ["a0", "a1"]),
            Dimension::new("B", ["b0", "b1"]),
            Dimension::new("C", ["c0", "c1"]),
        ];
        let requirement = requirement();
        let axes = axes(&dimensions, &requirement);
        let evaluator = Evaluator::new(&[]);

        let cover = cover(&axes, &requirement, evaluator);
        assert_eq!(
            cover,
            vec![vec![0, 0, 0], vec![0, 1, 1], vec![1, 0, 1], vec![1, 1, 0]]
        );
    }

    #[test]
    fn covers_every_pair_with_fewer_cases() {
        let dimensions = vec![
            Dimension::new("Browser", ["chrome", "firefox", "safari"]),
            Dimension::new("Locale", ["en", "fr", "de"]),
            Dimension::new("Os", ["linux", "mac", "windows"]),
            Dimension::new("Theme", ["light", "dark", "contrast"]),
        ];
        let requirement = requirement();
        let axes = axes(&dimensions, &requirement);
        let evaluator = Evaluator::new(&[]);

        let full = full_product(&axes, &requirement, evaluator);
        let cover = cover(&axes, &requirement, evaluator);

        assert_eq!(full.len(), 81);
        assert!(cover.len() < 20, "cover has {} cases", cover.len());
        assert_covers(&axes, &full, &cover);
    }

    #[test]
    fn respects_filters() {
        let dimensions = vec![
            Dimension::new("Browser", ["chrome", "firefox", "safari"]),
            Dimension::new("Locale", ["en", "fr"]),
            Dimension::new("Os", ["linux", "mac"]),
        ];
        let filters: Vec<Filter> = vec![
            toml::from_str("kind = \"require\"\nwhen = { Browser = \"safari\" }\nthen = { Os = \"mac\" }\n")
                .unwrap(),
            toml::from_str("kind = \"exclude\"\nmatches = { Browser = \"firefox\", Locale = \"fr\" }\n")
                .unwrap(),
        ];
        let requirement = requirement();
        let axes = axes(&dimensions, &requirement);
        let evaluator = Evaluator::new(&filters);

        let full = full_product(&axes, &requirement, evaluator);
        let cover = cover(&axes, &requirement, evaluator);

        for choice in &cover {
            let partial: Vec<(&str, &str)> = axes
                .iter()
                .zip(choice)
                .map(|(axis, &v)| (axis.name, axis.values[v].value))
                .collect();
            assert!(evaluator.accepts(&partial, &requirement));
        }
        assert_covers(&axes, &full, &cover);
    }

    #[test]
    fn single_dimension_lists_every_value() {
        let dimensions = vec![Dimension::new("Browser", ["chrome", "firefox"])];
        let requirement = requirement();
        let axes = axes(&dimensions, &requirement);

        let cover = cover(&axes, &requirement, Evaluator::new(&[]));
        assert_eq!(cover, vec![vec![0], vec![1]]);
    }

    #[test]
    fn no_dimensions_yield_the_empty_assignment() {
        let requirement = requirement();
        let cover = cover(&[], &requirement, Evaluator::new(&[]));
        assert_eq!(cover, vec![Vec::<usize>::new()]);
    }
}
