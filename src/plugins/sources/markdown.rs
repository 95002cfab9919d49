use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use regex::Regex;
use serde::Deserialize;
use walkdir::WalkDir;

use super::{PluginError, RequirementsGenerator};
use crate::domain::{Requirement, RequirementId};

/// Reads one requirement per Markdown document.
///
/// A document looks like:
///
/// ```markdown
/// ---
/// tags: [ui]
/// metadata:
///   priority: high
/// ---
/// # AUTH-001 Login with password
///
/// Users can log in with their email and password.
/// ```
///
/// The frontmatter is optional and unknown frontmatter fields are ignored.
/// The identifier is the first token of the first heading, the rest of the
/// heading is the title, and everything after the heading is the
/// description.
pub struct Markdown;

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#+\s+(\S+)(?:\s+(.*?))?\s*$").expect("valid regex"));

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FrontMatter {
    tags: BTreeSet<String>,
    metadata: BTreeMap<String, String>,
}

impl RequirementsGenerator for Markdown {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn description(&self) -> &'static str {
        "one requirement per Markdown document with YAML frontmatter"
    }

    fn generate(&self, input: &Path) -> Result<Vec<Requirement>, PluginError> {
        let paths: Vec<PathBuf> = WalkDir::new(input)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| {
                entry
                    .map_err(|e| tracing::warn!("skipping unreadable entry: {e}"))
                    .ok()
            })
            .filter(|entry| entry.file_type().is_file())
            .map(walkdir::DirEntry::into_path)
            .filter(|path| path.extension().is_some_and(|ext| ext == "md"))
            .collect();

        paths
            .par_iter()
            .map(|path| {
                let content = fs::read_to_string(path).map_err(|source| PluginError::Io {
                    path: path.clone(),
                    source,
                })?;
                parse(path, &content)
            })
            .collect()
    }
}

fn parse(path: &Path, content: &str) -> Result<Requirement, PluginError> {
    let (front, body) = split_frontmatter(path, content)?;
    let front: FrontMatter = match front {
        Some(yaml) if !yaml.trim().is_empty() => {
            serde_yaml::from_str(yaml).map_err(|source| PluginError::Frontmatter {
                path: path.to_path_buf(),
                source,
            })?
        }
        _ => FrontMatter::default(),
    };

    let mut lines = body.lines();
    let heading = lines
        .by_ref()
        .find(|line| line.trim_start().starts_with('#'))
        .ok_or_else(|| PluginError::format(path, "no heading found"))?;
    let captures = HEADING
        .captures(heading.trim())
        .ok_or_else(|| PluginError::format(path, "no identifier in heading"))?;

    let id = RequirementId::new(&captures[1]).map_err(|e| PluginError::empty_id(path, &e))?;
    let mut requirement = Requirement::new(id);
    if let Some(title) = captures.get(2).map(|m| m.as_str()).filter(|t| !t.is_empty()) {
        requirement = requirement.with_title(title);
    }

    let description = lines.collect::<Vec<_>>().join("\n");
    let description = description.trim();
    if !description.is_empty() {
        requirement = requirement.with_description(description);
    }

    for tag in front.tags {
        requirement = requirement.with_tag(tag);
    }
    for (key, value) in front.metadata {
        requirement = requirement.with_metadata(key, value);
    }
    Ok(requirement)
}

/// Splits a document into its frontmatter (if any) and the rest.
fn split_frontmatter<'a>(
    path: &Path,
    content: &'a str,
) -> Result<(Option<&'a str>, &'a str), PluginError> {
    let Some(rest) = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))
    else {
        return Ok((None, content));
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim() == "---" {
            return Ok((Some(&rest[..offset]), &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    Err(PluginError::format(path, "unterminated frontmatter"))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn parse_str(content: &str) -> Result<Requirement, PluginError> {
        parse(Path::new("test.md"), content)
    }

    #[test]
    fn parses_full_document() {
        let requirement = parse_str(
            "---
tags: [ui, auth]
metadata:
  priority: high
---
# AUTH-001 Login with password

Users can log in.

Second paragraph.
",
        )
        .unwrap();

        assert_eq!(requirement.id().as_str(), "AUTH-001");
        assert_eq!(requirement.title(), Some("Login with password"));
        assert_eq!(
            requirement.description(),
            Some("Users can log in.\n\nSecond paragraph.")
        );
        assert!(requirement.has_tag("ui"));
        assert!(requirement.has_tag("auth"));
        assert_eq!(requirement.metadata()["priority"], "high");
    }

    #[test]
    fn frontmatter_is_optional() {
        let requirement = parse_str("# R1\n").unwrap();
        assert_eq!(requirement.id().as_str(), "R1");
        assert_eq!(requirement.title(), None);
        assert_eq!(requirement.description(), None);
        assert!(requirement.tags().is_empty());
    }

    #[test]
    fn unknown_frontmatter_fields_are_ignored() {
        let requirement = parse_str(
            "---
_version: '1'
uuid: 12b3f5c5-b1a8-4aa8-a882-20ff1c2aab53
created: 2025-07-22T13:14:40Z
tags: [ui]
---
# USR-001 Plain title
",
        )
        .unwrap();
        assert_eq!(requirement.id().as_str(), "USR-001");
        assert!(requirement.has_tag("ui"));
    }

    #[test]
    fn missing_heading_is_an_error() {
        let error = parse_str("---\ntags: []\n---\nno heading here\n").unwrap_err();
        assert!(matches!(error, PluginError::Format { .. }));
    }

    #[test]
    fn unterminated_frontmatter_is_an_error() {
        let error = parse_str("---\ntags: []\n# R1\n").unwrap_err();
        assert!(matches!(error, PluginError::Format { .. }));
    }

    #[test]
    fn invalid_frontmatter_is_an_error() {
        let error = parse_str("---\ntags: [\n---\n# R1\n").unwrap_err();
        assert!(matches!(error, PluginError::Frontmatter { .. }));
    }

    #[test]
    fn generates_from_nested_directories_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("auth")).unwrap();
        fs::write(tmp.path().join("auth").join("login.md"), "# R2 Login\n").unwrap();
        fs::write(tmp.path().join("a.md"), "# R1 First\n").unwrap();
        fs::write(tmp.path().join("notes.txt"), "# R3 Ignored\n").unwrap();

        let requirements = Markdown.generate(tmp.path()).unwrap();
        let ids: Vec<&str> = requirements.iter().map(|r| r.id().as_str()).collect();
        assert_eq!(ids, vec!["R1", "R2"]);
    }
}
