use std::fmt::Write as _;

use super::{MarkupPlugin, RenderError};
use crate::domain::TestCase;

/// Renders a test case as a Markdown document with an assignment table.
pub struct Markdown;

impl MarkupPlugin for Markdown {
    fn name(&self) -> &'static str {
        "md"
    }

    fn render(&self, case: &TestCase) -> Result<String, RenderError> {
        let mut out = String::new();
        match case.summary() {
            Some(summary) => writeln!(out, "# {}: {summary}", case.requirement()),
            None => writeln!(out, "# {}", case.requirement()),
        }
        .expect("writing to a String never fails");
        out.push('\n');

        if case.assignment().is_empty() {
            out.push_str("_No dimensions._\n");
        } else {
            out.push_str("| Dimension | Value |\n| --- | --- |\n");
            for a in case.assignment() {
                writeln!(out, "| {} | {} |", escape(&a.dimension), escape(&a.value))
                    .expect("writing to a String never fails");
            }
        }

        writeln!(out, "\nIdentity: `{}`", case.identity_key())
            .expect("writing to a String never fails");
        Ok(out)
    }
}

fn escape(cell: &str) -> String {
    cell.replace('|', r"\|")
}
