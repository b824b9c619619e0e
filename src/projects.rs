use crate::error::{HacktrackError, Result};
use crate::model::ProjectRef;
use std::fs::File;
use std::path::Path;

const USER_COLUMN: &str = "user";
const REPO_COLUMN: &str = "repo";

/// Read a delimited project list with `user` and `repo` columns.
///
/// Extra columns are ignored. Any failure to open or parse the file is
/// reported as [`HacktrackError::ProjectList`].
pub fn read_project_list<P: AsRef<Path>>(path: P) -> Result<Vec<ProjectRef>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| HacktrackError::project_list(path, e))?;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| HacktrackError::project_list(path, e))?
        .clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| HacktrackError::project_list(path, format!("missing column '{name}'")))
    };
    let user_idx = column(USER_COLUMN)?;
    let repo_idx = column(REPO_COLUMN)?;

    let mut projects = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| HacktrackError::project_list(path, e))?;
        let owner = record.get(user_idx).unwrap_or_default();
        let repo = record.get(repo_idx).unwrap_or_default();
        if owner.is_empty() || repo.is_empty() {
            return Err(HacktrackError::project_list(
                path,
                format!("row {} has an empty user or repo", line + 1),
            ));
        }
        projects.push(ProjectRef::new(owner, repo));
    }

    Ok(projects)
}
