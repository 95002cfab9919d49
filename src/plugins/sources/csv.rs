use std::{
    fs,
    path::{Path, PathBuf},
};

use super::{PluginError, RequirementsGenerator};
use crate::domain::{Requirement, RequirementId};

/// Reads requirements from CSV tables, one requirement per row.
///
/// The header row must contain an `id` column. `title`, `description` and
/// `tags` (separated by `;`) are optional; any other column becomes a
/// metadata entry. Empty cells are skipped.
pub struct Csv;

const TAG_SEPARATOR: char = ';';

impl RequirementsGenerator for Csv {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn description(&self) -> &'static str {
        "one requirement per row of a CSV table"
    }

    fn generate(&self, input: &Path) -> Result<Vec<Requirement>, PluginError> {
        let io_error = |source| PluginError::Io {
            path: input.to_path_buf(),
            source,
        };
        let mut paths: Vec<PathBuf> = fs::read_dir(input)
            .map_err(io_error)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<_, _>>()
            .map_err(io_error)?;
        paths.retain(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "csv"));
        paths.sort();

        let mut requirements = Vec::new();
        for path in &paths {
            requirements.extend(read_table(path)?);
        }
        Ok(requirements)
    }
}

fn read_table(path: &Path) -> Result<Vec<Requirement>, PluginError> {
    let csv_error = |source| PluginError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = ::csv::ReaderBuilder::new()
        .trim(::csv::Trim::All)
        .from_path(path)
        .map_err(csv_error)?;

    let headers = reader.headers().map_err(csv_error)?.clone();
    let id_column = headers
        .iter()
        .position(|h| h == "id")
        .ok_or_else(|| PluginError::format(path, "missing 'id' column"))?;

    let mut requirements = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        let id = RequirementId::new(record.get(id_column).unwrap_or_default())
            .map_err(|e| PluginError::empty_id(path, &e))?;
        let mut requirement = Requirement::new(id);

        for (column, cell) in headers.iter().zip(record.iter()) {
            if cell.is_empty() {
                continue;
            }
            requirement = match column {
                "id" => requirement,
                "title" => requirement.with_title(cell),
                "description" => requirement.with_description(cell),
                "tags" => cell
                    .split(TAG_SEPARATOR)
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .fold(requirement, Requirement::with_tag),
                key => requirement.with_metadata(key, cell),
            };
        }
        requirements.push(requirement);
    }
    Ok(requirements)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_rows_with_metadata() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join("reqs.csv"),
            "id,title,tags,priority,owner\n\
             R1,Login,ui; auth,high,\n\
             R2,,api,,team-a\n",
        )
        .unwrap();

        let requirements = Csv.generate(tmp.path()).unwrap();

        assert_eq!(requirements.len(), 2);
        let login = &requirements[0];
        assert_eq!(login.id().as_str(), "R1");
        assert_eq!(login.title(), Some("Login"));
        assert!(login.has_tag("ui"));
        assert!(login.has_tag("auth"));
        assert_eq!(login.metadata()["priority"], "high");
        assert!(!login.metadata().contains_key("owner"));

        let api = &requirements[1];
        assert_eq!(api.title(), None);
        assert_eq!(api.metadata()["owner"], "team-a");
    }

    #[test]
    fn files_are_read_in_name_order() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("b.csv"), "id\nR2\n").unwrap();
        fs::write(tmp.path().join("a.csv"), "id\nR1\n").unwrap();
        fs::write(tmp.path().join("c.txt"), "id\nR3\n").unwrap();

        let ids: Vec<String> = Csv
            .generate(tmp.path())
            .unwrap()
            .iter()
            .map(|r| r.id().to_string())
            .collect();
        assert_eq!(ids, vec!["R1", "R2"]);
    }

    #[test]
    fn missing_id_column_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("reqs.csv"), "title\nLogin\n").unwrap();
        assert!(matches!(
            Csv.generate(tmp.path()).unwrap_err(),
            PluginError::Format { .. }
        ));
    }

    #[test]
    fn empty_id_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("reqs.csv"), "id,title\n,Login\n").unwrap();
        assert!(matches!(
            Csv.generate(tmp.path()).unwrap_err(),
            PluginError::Format { .. }
        ));
    }
}
