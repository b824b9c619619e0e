//! GitHub REST client and the SQLite-backed [`MetadataProvider`] built on it.

use crate::cache::Cache;
use crate::error::{HacktrackError, Result};
use crate::model::{start_of_day, CommitRecord, IssueRecord, ProjectRef};
use crate::provider::MetadataProvider;
use chrono::{DateTime, NaiveDate, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info, warn};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const API_URL_ENV: &str = "GITHUB_API_URL";
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

const PER_PAGE: usize = 100;
const MAX_PAGES: usize = 1000;

#[derive(Debug, Deserialize)]
struct ApiCommitSummary {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct ApiCommitDetail {
    sha: String,
    commit: ApiGitCommit,
    #[serde(default)]
    author: Option<Value>,
    #[serde(default)]
    stats: Option<ApiStats>,
}

#[derive(Debug, Deserialize)]
struct ApiGitCommit {
    #[serde(default)]
    author: Option<ApiGitAuthor>,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ApiGitAuthor {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    date: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiStats {
    #[serde(default)]
    additions: u64,
    #[serde(default)]
    deletions: u64,
}

#[derive(Debug, Deserialize)]
struct ApiIssue {
    number: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    state: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    user: Option<Value>,
    #[serde(default)]
    pull_request: Option<Value>,
}

impl From<ApiCommitDetail> for CommitRecord {
    fn from(api: ApiCommitDetail) -> Self {
        let stats = api.stats.unwrap_or_default();
        let (author_name, author_email, date) = match api.commit.author {
            Some(a) => (a.name, a.email, a.date),
            None => (String::new(), String::new(), None),
        };
        CommitRecord {
            sha: api.sha,
            additions: stats.additions,
            deletions: stats.deletions,
            author: api.author,
            author_name,
            author_email,
            date,
            message: api.commit.message,
        }
    }
}

impl From<ApiIssue> for IssueRecord {
    fn from(api: ApiIssue) -> Self {
        IssueRecord {
            number: api.number,
            title: api.title,
            state: api.state,
            created_at: api.created_at,
            closed_at: api.closed_at,
            user: api.user,
            is_pull_request: api.pull_request.is_some(),
        }
    }
}

pub struct GithubClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl GithubClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("hacktrack/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    /// Build from `GITHUB_API_URL` and `GITHUB_TOKEN`.
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let token = std::env::var(TOKEN_ENV).ok();
        Self::new(base_url, token)
    }

    fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .http
            .get(&url)
            .query(query)
            .header(ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        debug!(%url, ?query, "GET");
        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(HacktrackError::Api {
                status: status.as_u16(),
                url,
            });
        }
        Ok(response.json()?)
    }

    fn get_all_pages<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let mut all = Vec::new();
        for page in 1..=MAX_PAGES {
            let mut paged = query.to_vec();
            paged.push(("per_page", PER_PAGE.to_string()));
            paged.push(("page", page.to_string()));

            let items: Vec<T> = self.get(path, &paged)?;
            let last = items.len() < PER_PAGE;
            all.extend(items);
            if last {
                return Ok(all);
            }
        }
        warn!(path, pages = MAX_PAGES, "page limit reached, results truncated");
        Ok(all)
    }

    pub fn list_commit_shas(&self, project: &ProjectRef, since: NaiveDate) -> Result<Vec<String>> {
        let path = format!("/repos/{}/{}/commits", project.owner, project.repo);
        let commits: Vec<ApiCommitSummary> =
            self.get_all_pages(&path, &[("since", since_param(since))])?;
        Ok(commits.into_iter().map(|c| c.sha).collect())
    }

    pub fn commit(&self, project: &ProjectRef, sha: &str) -> Result<CommitRecord> {
        let path = format!("/repos/{}/{}/commits/{}", project.owner, project.repo, sha);
        let detail: ApiCommitDetail = self.get(&path, &[])?;
        Ok(detail.into())
    }

    pub fn list_issues(&self, project: &ProjectRef, since: NaiveDate) -> Result<Vec<IssueRecord>> {
        let path = format!("/repos/{}/{}/issues", project.owner, project.repo);
        let issues: Vec<ApiIssue> = self.get_all_pages(
            &path,
            &[("state", "all".to_string()), ("since", since_param(since))],
        )?;
        Ok(issues.into_iter().map(IssueRecord::from).collect())
    }
}

fn since_param(since: NaiveDate) -> String {
    start_of_day(since).format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Provider that refreshes a per-data-dir SQLite cache from the GitHub API.
pub struct GithubProvider {
    client: GithubClient,
    progress: bool,
}

impl GithubProvider {
    pub fn new(client: GithubClient) -> Self {
        Self {
            client,
            progress: false,
        }
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    fn progress_bar(&self, len: usize, project: &ProjectRef) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} {msg} [{bar:30}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb.set_message(format!("Fetching commits for {}", project.slug()));
        pb
    }
}

impl MetadataProvider for GithubProvider {
    fn update_commits(
        &self,
        owner: &str,
        repo: &str,
        data_dir: &Path,
        since: NaiveDate,
    ) -> Result<Option<Vec<CommitRecord>>> {
        let project = ProjectRef::new(owner, repo);
        let mut cache = Cache::open(data_dir)?;

        let shas = self.client.list_commit_shas(&project, since)?;
        let missing = cache.missing_commits(&project, &shas)?;
        debug!(project = %project.slug(), listed = shas.len(), missing = missing.len(), "commit listing");

        if !missing.is_empty() {
            let pb = self.progress_bar(missing.len(), &project);
            let mut fetched = Vec::with_capacity(missing.len());
            for sha in &missing {
                fetched.push(self.client.commit(&project, sha)?);
                pb.inc(1);
            }
            pb.finish_and_clear();
            cache.store_commits(&project, &fetched)?;
            info!(project = %project.slug(), stored = fetched.len(), "cached commits");
        }

        cache.load_commits(&project)
    }

    fn load_commits(
        &self,
        owner: &str,
        repo: &str,
        data_dir: &Path,
    ) -> Result<Option<Vec<CommitRecord>>> {
        match Cache::open_existing(data_dir)? {
            Some(cache) => cache.load_commits(&ProjectRef::new(owner, repo)),
            None => Ok(None),
        }
    }

    fn update_issues(
        &self,
        owner: &str,
        repo: &str,
        data_dir: &Path,
        since: NaiveDate,
    ) -> Result<Option<Vec<IssueRecord>>> {
        let project = ProjectRef::new(owner, repo);
        let mut cache = Cache::open(data_dir)?;

        let issues = self.client.list_issues(&project, since)?;
        if !issues.is_empty() {
            cache.store_issues(&project, &issues)?;
            info!(project = %project.slug(), stored = issues.len(), "cached issues");
        }

        cache.load_issues(&project)
    }

    fn load_issues(
        &self,
        owner: &str,
        repo: &str,
        data_dir: &Path,
    ) -> Result<Option<Vec<IssueRecord>>> {
        match Cache::open_existing(data_dir)? {
            Some(cache) => cache.load_issues(&ProjectRef::new(owner, repo)),
            None => Ok(None),
        }
    }
}
