use std::fmt::Write as _;

use super::{MarkupPlugin, RenderError};
use crate::domain::TestCase;

/// Renders a test case as a standalone HTML page.
pub struct Html;

impl MarkupPlugin for Html {
    fn name(&self) -> &'static str {
        "html"
    }

    fn render(&self, case: &TestCase) -> Result<String, RenderError> {
        let title = match case.summary() {
            Some(summary) => format!("{}: {summary}", case.requirement()),
            None => case.requirement().to_string(),
        };
        let title = escape(&title);

        let mut out = String::new();
        out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        writeln!(out, "<title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>")
            .expect("writing to a String never fails");

        if case.assignment().is_empty() {
            out.push_str("<p><em>No dimensions.</em></p>\n");
        } else {
            out.push_str("<table>\n<tr><th>Dimension</th><th>Value</th></tr>\n");
            for a in case.assignment() {
                writeln!(
                    out,
                    "<tr><td>{}</td><td>{}</td></tr>",
                    escape(&a.dimension),
                    escape(&a.value)
                )
                .expect("writing to a String never fails");
            }
            out.push_str("</table>\n");
        }

        writeln!(
            out,
            "<p>Identity: <code>{}</code></p>\n</body>\n</html>",
            escape(&case.identity_key().to_string())
        )
        .expect("writing to a String never fails");
        Ok(out)
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
