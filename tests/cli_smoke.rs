use assert_cmd::prelude::*;
use chrono::{TimeZone, Utc};
use hacktrack::cache::Cache;
use hacktrack::model::{CommitRecord, IssueRecord, ProjectRef};
use serde_json::json;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

fn commit(sha: &str, additions: u64, login: &str) -> CommitRecord {
    CommitRecord {
        sha: sha.to_string(),
        additions,
        deletions: 1,
        author: Some(json!({ "login": login })),
        author_name: login.to_string(),
        author_email: format!("{login}@example.com"),
        date: Some(Utc.with_ymd_and_hms(2019, 5, 1, 0, 0, 0).unwrap()),
        message: "msg".to_string(),
    }
}

fn issue(number: u64, year: i32) -> IssueRecord {
    IssueRecord {
        number,
        title: "bug".to_string(),
        state: "open".to_string(),
        created_at: Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap(),
        closed_at: None,
        user: Some(json!({ "login": "reporter" })),
        is_pull_request: false,
    }
}

fn seed(dir: &Path) {
    fs::write(
        dir.join("projects.csv"),
        "user,repo\noctocat,hello-world\nrust-lang,rustlings\n",
    )
    .unwrap();

    let mut cache = Cache::open(dir).unwrap();
    let project = ProjectRef::new("octocat", "hello-world");
    cache
        .store_commits(
            &project,
            &[commit("aaa", 50, "octocat"), commit("bbb", 20000, "octocat")],
        )
        .unwrap();
    cache
        .store_issues(&project, &[issue(1, 2017), issue(2, 2019)])
        .unwrap();
}

fn hacktrack_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("hacktrack").unwrap();
    cmd.env_remove("HACKTRACK_LOG")
        .env_remove("HACKTRACK_DATA_DIR")
        .arg("--data-dir")
        .arg(dir);
    cmd
}

#[test]
fn commits_json_lists_filtered_rows() {
    let dir = tempdir().unwrap();
    seed(dir.path());

    let out = hacktrack_cmd(dir.path())
        .args(["commits", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
    let rows = v["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["project"], "octocat/hello-world");
    assert_eq!(rows[0]["user"], "octocat");
    assert_eq!(rows[0]["sha"], "aaa");
    assert_eq!(rows[0]["index"], 0);
    assert_eq!(v["update"], false);
}

#[test]
fn issues_ndjson_respects_since() {
    let dir = tempdir().unwrap();
    seed(dir.path());

    let out = hacktrack_cmd(dir.path())
        .args(["--since", "2018-08-05", "issues", "--ndjson"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let lines: Vec<serde_json::Value> = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["number"], 2);
    assert_eq!(lines[0]["author"], "reporter");
}

#[test]
fn summary_json_covers_every_listed_project() {
    let dir = tempdir().unwrap();
    seed(dir.path());

    let out = hacktrack_cmd(dir.path())
        .args(["summary", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
    let summaries = v.as_array().unwrap();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0]["project"], "octocat/hello-world");
    assert_eq!(summaries[0]["commits"], 1);
    assert_eq!(summaries[0]["issues"], 1);
    assert_eq!(summaries[0]["contributors"], 1);
    assert_eq!(summaries[1]["project"], "rust-lang/rustlings");
    assert_eq!(summaries[1]["commits"], 0);
}

#[test]
fn table_output_prints_progress_lines() {
    let dir = tempdir().unwrap();
    seed(dir.path());

    let out = hacktrack_cmd(dir.path())
        .arg("summary")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Getting commit and issue information for octocat/hello-world"));
    assert!(text.contains("Getting commit and issue information for rust-lang/rustlings"));

    let quiet = hacktrack_cmd(dir.path())
        .args(["--quiet", "summary"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert!(!String::from_utf8(quiet)
        .unwrap()
        .contains("commit and issue information"));
}

#[test]
fn missing_project_list_fails() {
    let dir = tempdir().unwrap();

    hacktrack_cmd(dir.path())
        .args(["commits", "--json"])
        .assert()
        .failure();
}

#[test]
fn invalid_since_fails() {
    let dir = tempdir().unwrap();
    seed(dir.path());

    hacktrack_cmd(dir.path())
        .args(["--since", "yesterday-ish", "commits"])
        .assert()
        .failure();
}

#[test]
fn timestamp_since_is_rejected() {
    let dir = tempdir().unwrap();
    seed(dir.path());

    hacktrack_cmd(dir.path())
        .args(["--since", "2018-08-05T13:00:00Z", "commits", "--json"])
        .assert()
        .failure();
}
