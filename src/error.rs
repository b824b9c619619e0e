use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HacktrackError>;

#[derive(Error, Debug)]
pub enum HacktrackError {
    #[error("Cannot read project list {}: {reason}", path.display())]
    ProjectList { path: PathBuf, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Cache error: {0}")]
    Cache(String),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("GitHub API returned {status} for {url}")]
    Api { status: u16, url: String },
    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

impl HacktrackError {
    pub(crate) fn project_list(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        HacktrackError::ProjectList {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
