use crate::error::{HacktrackError, Result};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

pub const SCHEMA_VERSION: u32 = 1;

/// Commits touching this many lines (added or deleted) are dropped.
pub const MAX_LINES_CHANGED: u64 = 10_000;

pub const DEFAULT_SINCE: &str = "2018-08-05";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectRef {
    pub owner: String,
    pub repo: String,
}

impl ProjectRef {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub sha: String,
    pub additions: u64,
    pub deletions: u64,
    /// GitHub account of the author; null when the commit email is not linked.
    #[serde(default)]
    pub author: Option<Value>,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub author_email: String,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub state: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user: Option<Value>,
    #[serde(default)]
    pub is_pull_request: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitRow {
    pub index: usize,
    pub project: String,
    pub user: String,
    #[serde(flatten)]
    pub commit: CommitRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueRow {
    pub index: usize,
    pub project: String,
    pub author: String,
    #[serde(flatten)]
    pub issue: IssueRecord,
}

pub trait Indexed {
    fn project(&self) -> &str;
    fn set_index(&mut self, index: usize);
}

impl Indexed for CommitRow {
    fn project(&self) -> &str {
        &self.project
    }

    fn set_index(&mut self, index: usize) {
        self.index = index;
    }
}

impl Indexed for IssueRow {
    fn project(&self) -> &str {
        &self.project
    }

    fn set_index(&mut self, index: usize) {
        self.index = index;
    }
}

/// Row-wise union of per-project batches with a contiguous zero-based index.
#[derive(Debug, Clone, PartialEq)]
pub struct Table<R> {
    rows: Vec<R>,
}

impl<R: Indexed> Table<R> {
    pub fn from_batches(batches: Vec<Vec<R>>) -> Self {
        let mut rows: Vec<R> = batches.into_iter().flatten().collect();
        for (index, row) in rows.iter_mut().enumerate() {
            row.set_index(index);
        }
        Self { rows }
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<R> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.rows.iter()
    }

    pub fn projects(&self) -> BTreeSet<&str> {
        self.rows.iter().map(|r| r.project()).collect()
    }
}

impl<R> Default for Table<R> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<'a, R> IntoIterator for &'a Table<R> {
    type Item = &'a R;
    type IntoIter = std::slice::Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Login of a GitHub account value, or `""` when the value is absent, null,
/// not a mapping, or has no string `login`.
pub fn login_of(account: Option<&Value>) -> String {
    match account {
        Some(Value::Object(map)) => map
            .get("login")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}

/// Parse a `YYYY-MM-DD` date. Timestamps are rejected rather than truncated.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|e| HacktrackError::InvalidDate(format!("'{input}': {e}")))
}

/// Midnight UTC at the start of `date`.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

pub fn default_since() -> NaiveDate {
    NaiveDate::from_ymd_opt(2018, 8, 5).unwrap_or_default()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableOutput<R> {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub since: NaiveDate,
    pub update: bool,
    pub rows: Vec<R>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectSummary {
    pub project: String,
    pub commits: usize,
    pub issues: usize,
    pub additions: u64,
    pub deletions: u64,
    pub contributors: usize,
}
