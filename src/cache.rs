use crate::error::{HacktrackError, Result};
use crate::model::{CommitRecord, IssueRecord, ProjectRef, SCHEMA_VERSION};
use rusqlite::{params, Connection, OpenFlags};
use std::collections::HashSet;
use std::path::Path;

pub const CACHE_FILE: &str = "cache.db";

pub struct Cache {
    conn: Connection,
}

impl Cache {
    /// Open (creating if needed) the cache database inside `data_dir`.
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        std::fs::create_dir_all(data_dir.as_ref())?;
        let conn = Connection::open(data_dir.as_ref().join(CACHE_FILE))?;
        let mut cache = Self { conn };
        cache.initialize()?;
        Ok(cache)
    }

    /// Open an existing cache read-only. `None` when there is no database, or
    /// when it was never initialized by [`Cache::open`].
    pub fn open_existing<P: AsRef<Path>>(data_dir: P) -> Result<Option<Self>> {
        let db_path = data_dir.as_ref().join(CACHE_FILE);
        if !db_path.is_file() {
            return Ok(None);
        }
        let conn = Connection::open_with_flags(&db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        let cache = Self { conn };
        match cache.schema_version()? {
            0 => Ok(None),
            v if v == SCHEMA_VERSION as i64 => Ok(Some(cache)),
            v => Err(schema_mismatch(v)),
        }
    }

    fn initialize(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS commits (
                owner TEXT NOT NULL,
                repo TEXT NOT NULL,
                sha TEXT NOT NULL,
                committed_at INTEGER,
                payload TEXT NOT NULL,
                PRIMARY KEY (owner, repo, sha)
            );
            CREATE TABLE IF NOT EXISTS issues (
                owner TEXT NOT NULL,
                repo TEXT NOT NULL,
                number INTEGER NOT NULL,
                payload TEXT NOT NULL,
                PRIMARY KEY (owner, repo, number)
            );
            CREATE INDEX IF NOT EXISTS idx_commits_committed_at ON commits(committed_at);
            ",
        )?;
        self.check_schema_version()?;
        Ok(())
    }

    fn schema_version(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))?)
    }

    fn check_schema_version(&mut self) -> Result<()> {
        let user_version = self.schema_version()?;

        if user_version == 0 {
            let set_stmt = format!("PRAGMA user_version = {SCHEMA_VERSION};");
            self.conn.execute_batch(&set_stmt)?;
        } else if user_version != SCHEMA_VERSION as i64 {
            return Err(schema_mismatch(user_version));
        }

        Ok(())
    }

    /// SHAs from `shas` that are not stored yet for `project`, in input order.
    pub fn missing_commits(&self, project: &ProjectRef, shas: &[String]) -> Result<Vec<String>> {
        if shas.is_empty() {
            return Ok(Vec::new());
        }
        let mut stmt = self
            .conn
            .prepare("SELECT sha FROM commits WHERE owner = ? AND repo = ?")?;
        let existing: HashSet<String> = stmt
            .query_map(params![project.owner, project.repo], |row| {
                row.get::<_, String>(0)
            })?
            .collect::<rusqlite::Result<HashSet<_>>>()?;
        Ok(shas
            .iter()
            .filter(|sha| !existing.contains(*sha))
            .cloned()
            .collect())
    }

    pub fn store_commits(&mut self, project: &ProjectRef, commits: &[CommitRecord]) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut insert = tx.prepare(
                "INSERT OR REPLACE INTO commits (owner, repo, sha, committed_at, payload)
                 VALUES (?, ?, ?, ?, ?)",
            )?;
            for commit in commits {
                insert.execute(params![
                    project.owner,
                    project.repo,
                    commit.sha,
                    commit.date.map(|d| d.timestamp()),
                    serde_json::to_string(commit)?
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Every cached commit for `project`, newest first; `None` when there are none.
    pub fn load_commits(&self, project: &ProjectRef) -> Result<Option<Vec<CommitRecord>>> {
        let mut stmt = self.conn.prepare(
            "SELECT payload FROM commits WHERE owner = ? AND repo = ?
             ORDER BY committed_at DESC, sha",
        )?;
        let payloads = stmt
            .query_map(params![project.owner, project.repo], |row| {
                row.get::<_, String>(0)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        decode_all(payloads)
    }

    pub fn store_issues(&mut self, project: &ProjectRef, issues: &[IssueRecord]) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut insert = tx.prepare(
                "INSERT OR REPLACE INTO issues (owner, repo, number, payload)
                 VALUES (?, ?, ?, ?)",
            )?;
            for issue in issues {
                insert.execute(params![
                    project.owner,
                    project.repo,
                    issue.number as i64,
                    serde_json::to_string(issue)?
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Every cached issue for `project`, highest number first; `None` when there are none.
    pub fn load_issues(&self, project: &ProjectRef) -> Result<Option<Vec<IssueRecord>>> {
        let mut stmt = self.conn.prepare(
            "SELECT payload FROM issues WHERE owner = ? AND repo = ? ORDER BY number DESC",
        )?;
        let payloads = stmt
            .query_map(params![project.owner, project.repo], |row| {
                row.get::<_, String>(0)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        decode_all(payloads)
    }
}

fn schema_mismatch(found: i64) -> HacktrackError {
    HacktrackError::Cache(format!(
        "Schema version mismatch: expected {}, found {}",
        SCHEMA_VERSION, found
    ))
}

fn decode_all<T: serde::de::DeserializeOwned>(payloads: Vec<String>) -> Result<Option<Vec<T>>> {
    if payloads.is_empty() {
        return Ok(None);
    }
    let records = payloads
        .iter()
        .map(|p| serde_json::from_str(p))
        .collect::<std::result::Result<Vec<T>, _>>()?;
    Ok(Some(records))
}
