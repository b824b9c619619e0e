use crate::error::Result;
use crate::model::{CommitRecord, IssueRecord, ProjectRef};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Source of per-project commit and issue records.
///
/// `update_*` may hit the network and refresh whatever lives in `data_dir`;
/// `load_*` only reads what is already there. `Ok(None)` means the provider
/// has nothing for that project.
pub trait MetadataProvider {
    fn update_commits(
        &self,
        owner: &str,
        repo: &str,
        data_dir: &Path,
        since: NaiveDate,
    ) -> Result<Option<Vec<CommitRecord>>>;

    fn load_commits(&self, owner: &str, repo: &str, data_dir: &Path)
        -> Result<Option<Vec<CommitRecord>>>;

    fn update_issues(
        &self,
        owner: &str,
        repo: &str,
        data_dir: &Path,
        since: NaiveDate,
    ) -> Result<Option<Vec<IssueRecord>>>;

    fn load_issues(&self, owner: &str, repo: &str, data_dir: &Path)
        -> Result<Option<Vec<IssueRecord>>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    Update,
    Load,
}

impl FetchMode {
    pub fn from_update(update: bool) -> Self {
        if update {
            FetchMode::Update
        } else {
            FetchMode::Load
        }
    }

    pub fn verb(self) -> &'static str {
        match self {
            FetchMode::Update => "Updating",
            FetchMode::Load => "Getting",
        }
    }
}

/// Arguments handed to every provider call. `since` is only set in update mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchParams {
    pub data_dir: PathBuf,
    pub since: Option<NaiveDate>,
}

impl FetchParams {
    pub fn new(mode: FetchMode, data_dir: PathBuf, since: NaiveDate) -> Self {
        let since = match mode {
            FetchMode::Update => Some(since),
            FetchMode::Load => None,
        };
        Self { data_dir, since }
    }
}

type CommitFetcher<'p> = Box<dyn Fn(&ProjectRef) -> Result<Option<Vec<CommitRecord>>> + 'p>;
type IssueFetcher<'p> = Box<dyn Fn(&ProjectRef) -> Result<Option<Vec<IssueRecord>>> + 'p>;

/// The commit/issue fetcher pair for one aggregation call.
pub struct FetchStrategy<'p> {
    mode: FetchMode,
    commits: CommitFetcher<'p>,
    issues: IssueFetcher<'p>,
}

impl<'p> FetchStrategy<'p> {
    pub fn select(provider: &'p dyn MetadataProvider, params: FetchParams) -> Self {
        let FetchParams { data_dir, since } = params;
        match since {
            Some(since) => {
                let issues_dir = data_dir.clone();
                Self {
                    mode: FetchMode::Update,
                    commits: Box::new(move |p: &ProjectRef| {
                        provider.update_commits(&p.owner, &p.repo, &data_dir, since)
                    }),
                    issues: Box::new(move |p: &ProjectRef| {
                        provider.update_issues(&p.owner, &p.repo, &issues_dir, since)
                    }),
                }
            }
            None => {
                let issues_dir = data_dir.clone();
                Self {
                    mode: FetchMode::Load,
                    commits: Box::new(move |p: &ProjectRef| {
                        provider.load_commits(&p.owner, &p.repo, &data_dir)
                    }),
                    issues: Box::new(move |p: &ProjectRef| {
                        provider.load_issues(&p.owner, &p.repo, &issues_dir)
                    }),
                }
            }
        }
    }

    pub fn mode(&self) -> FetchMode {
        self.mode
    }

    pub fn commits(&self, project: &ProjectRef) -> Result<Option<Vec<CommitRecord>>> {
        (self.commits)(project)
    }

    pub fn issues(&self, project: &ProjectRef) -> Result<Option<Vec<IssueRecord>>> {
        (self.issues)(project)
    }
}
