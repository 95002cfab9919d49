use std::collections::BTreeMap;

use serde::Serialize;

use super::{MarkupPlugin, RenderError};
use crate::domain::TestCase;

/// Renders a test case as a JSON object.
pub struct Json;

#[derive(Serialize)]
struct View<'a> {
    requirement: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<&'a str>,
    identity: String,
    digest: String,
    assignment: BTreeMap<&'a str, &'a str>,
}

impl MarkupPlugin for Json {
    fn name(&self) -> &'static str {
        "json"
    }

    fn render(&self, case: &TestCase) -> Result<String, RenderError> {
        let key = case.identity_key();
        let view = View {
            requirement: case.requirement().as_str(),
            summary: case.summary(),
            identity: key.to_string(),
            digest: key.digest(),
            assignment: case
                .assignment()
                .iter()
                .map(|a| (a.dimension.as_str(), a.value.as_str()))
                .collect(),
        };
        let mut text = serde_json::to_string_pretty(&view)?;
        text.push('\n');
        Ok(text)
    }
}
