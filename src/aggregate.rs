use crate::error::Result;
use crate::model::{
    default_since, login_of, start_of_day, CommitRecord, CommitRow, IssueRecord, IssueRow,
    ProjectRef, Table, MAX_LINES_CHANGED,
};
use crate::projects::read_project_list;
use crate::provider::{FetchMode, FetchParams, FetchStrategy, MetadataProvider};
use crate::util;
use chrono::{DateTime, NaiveDate, Utc};
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct AggregateOptions {
    /// Defaults to `projects.csv` inside the bundled data directory.
    pub project_list: Option<PathBuf>,
    /// Defaults to the bundled data directory.
    pub data_dir: Option<PathBuf>,
    pub since: NaiveDate,
    pub update: bool,
    pub verbose: bool,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            project_list: None,
            data_dir: None,
            since: default_since(),
            update: false,
            verbose: true,
        }
    }
}

impl AggregateOptions {
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(util::default_data_dir)
    }

    pub fn project_list(&self) -> PathBuf {
        self.project_list
            .clone()
            .unwrap_or_else(|| util::default_project_list(&self.data_dir()))
    }
}

/// Fetch, filter, and combine commits and issues for every listed project,
/// writing progress lines to stdout when `verbose` is set.
pub fn get_project_info(
    options: &AggregateOptions,
    provider: &dyn MetadataProvider,
) -> Result<(Table<CommitRow>, Table<IssueRow>)> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    get_project_info_with_output(options, provider, &mut out)
}

pub fn get_project_info_with_output<W: Write>(
    options: &AggregateOptions,
    provider: &dyn MetadataProvider,
    out: &mut W,
) -> Result<(Table<CommitRow>, Table<IssueRow>)> {
    let projects = read_project_list(options.project_list())?;
    aggregate_projects(&projects, options, provider, out)
}

/// Same as [`get_project_info_with_output`] over an already parsed project
/// list; `options.project_list` is not consulted.
pub fn aggregate_projects<W: Write>(
    projects: &[ProjectRef],
    options: &AggregateOptions,
    provider: &dyn MetadataProvider,
    out: &mut W,
) -> Result<(Table<CommitRow>, Table<IssueRow>)> {
    let mode = FetchMode::from_update(options.update);
    let params = FetchParams::new(mode, options.data_dir(), options.since);
    let strategy = FetchStrategy::select(provider, params);
    let since = start_of_day(options.since);

    let mut commit_batches = Vec::with_capacity(projects.len());
    let mut issue_batches = Vec::with_capacity(projects.len());

    for project in projects {
        if options.verbose {
            writeln!(
                out,
                "{} commit and issue information for {}",
                strategy.mode().verb(),
                project.slug()
            )?;
        }

        let commits = strategy.commits(project)?;
        let issues = strategy.issues(project)?;

        if let Some(commits) = commits {
            let rows = commit_rows(project, commits);
            debug!(project = %project.slug(), rows = rows.len(), "kept commits");
            commit_batches.push(rows);
        }
        if let Some(issues) = issues {
            let rows = issue_rows(project, issues, since);
            debug!(project = %project.slug(), rows = rows.len(), "kept issues");
            issue_batches.push(rows);
        }
    }

    Ok((
        Table::from_batches(commit_batches),
        Table::from_batches(issue_batches),
    ))
}

/// Drop oversized commits and attach the project slug and author login.
pub fn commit_rows(project: &ProjectRef, commits: Vec<CommitRecord>) -> Vec<CommitRow> {
    let slug = project.slug();
    commits
        .into_iter()
        .filter(|c| c.additions < MAX_LINES_CHANGED && c.deletions < MAX_LINES_CHANGED)
        .map(|commit| CommitRow {
            index: 0,
            project: slug.clone(),
            user: login_of(commit.author.as_ref()),
            commit,
        })
        .collect()
}

/// Keep issues opened strictly after `since` and attach the project slug and
/// opener login.
pub fn issue_rows(
    project: &ProjectRef,
    issues: Vec<IssueRecord>,
    since: DateTime<Utc>,
) -> Vec<IssueRow> {
    let slug = project.slug();
    issues
        .into_iter()
        .filter(|i| i.created_at > since)
        .map(|issue| IssueRow {
            index: 0,
            project: slug.clone(),
            author: login_of(issue.user.as_ref()),
            issue,
        })
        .collect()
}
