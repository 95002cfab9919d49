use crate::domain::{Filter, Requirement};

/// Conjunction of the filters of one generation set.
///
/// Evaluation is pure: the outcome depends only on the partial assignment
/// and the requirement, never on previously generated cases.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
    filters: &'a [Filter],
}

impl<'a> Evaluator<'a> {
    /// Creates an evaluator over the given filters.
    #[must_use]
    pub const fn new(filters: &'a [Filter]) -> Self {
        Self { filters }
    }

    /// Returns `true` if every filter accepts the partial assignment for
    /// the requirement.
    #[must_use]
    pub fn accepts(&self, partial: &[(&str, &str)], requirement: &Requirement) -> bool {
        self.filters
            .iter()
            .all(|filter| filter.accepts(partial, requirement))
    }
}
