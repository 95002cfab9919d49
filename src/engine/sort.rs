use crate::domain::TestCase;

/// Puts test cases into their canonical order.
///
/// The order is total over distinct identity keys: requirement identifier,
/// then each assignment ordered by dimension name, comparing the dimension
/// name, the value's declared domain position and finally the value. The
/// result depends only on the contents of the input, never on its order.
#[must_use]
pub fn sort(mut cases: Vec<TestCase>) -> Vec<TestCase> {
    cases.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    cases
}
