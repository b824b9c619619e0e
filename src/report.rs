use crate::aggregate::{aggregate_projects, get_project_info, AggregateOptions};
use crate::cli::CommonArgs;
use crate::github::{GithubClient, GithubProvider};
use crate::model::{CommitRow, IssueRow, ProjectSummary, Table, TableOutput, SCHEMA_VERSION};
use crate::projects::read_project_list;
use crate::util::truncate;
use anyhow::Context;
use chrono::Utc;
use console::style;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

type Tables = (Table<CommitRow>, Table<IssueRow>);

fn provider(options: &AggregateOptions) -> anyhow::Result<GithubProvider> {
    let client = GithubClient::from_env().context("Failed to build GitHub client")?;
    Ok(GithubProvider::new(client).with_progress(options.verbose && options.update))
}

fn collect(options: &AggregateOptions) -> anyhow::Result<Tables> {
    get_project_info(options, &provider(options)?)
        .context("Failed to collect project information")
}

/// Options for machine-readable output; progress lines would corrupt stdout.
fn options_for(common: &CommonArgs, machine: bool) -> anyhow::Result<AggregateOptions> {
    let mut options = common.options().context("Invalid arguments")?;
    if machine {
        options.verbose = false;
    }
    Ok(options)
}

pub fn summary(common: &CommonArgs, json: bool) -> anyhow::Result<()> {
    let options = options_for(common, json)?;
    let projects = read_project_list(options.project_list())
        .context("Failed to read project list")?;
    let (commits, issues) = aggregate_projects(
        &projects,
        &options,
        &provider(&options)?,
        &mut std::io::stdout().lock(),
    )
    .context("Failed to collect project information")?;

    let slugs: Vec<String> = projects.iter().map(|p| p.slug()).collect();
    let summaries = summarize(&slugs, &commits, &issues);

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        output_summary_table(&summaries);
    }
    Ok(())
}

pub fn commits(common: &CommonArgs, json: bool, ndjson: bool) -> anyhow::Result<()> {
    let options = options_for(common, json || ndjson)?;
    let (commits, _) = collect(&options)?;

    if json {
        output_json(commits.into_rows(), &options)
    } else if ndjson {
        output_ndjson(commits.rows())
    } else {
        output_commit_table(&commits);
        Ok(())
    }
}

pub fn issues(common: &CommonArgs, json: bool, ndjson: bool) -> anyhow::Result<()> {
    let options = options_for(common, json || ndjson)?;
    let (_, issues) = collect(&options)?;

    if json {
        output_json(issues.into_rows(), &options)
    } else if ndjson {
        output_ndjson(issues.rows())
    } else {
        output_issue_table(&issues);
        Ok(())
    }
}

/// One summary per listed project, in list order; duplicates collapse.
pub fn summarize(
    projects: &[String],
    commits: &Table<CommitRow>,
    issues: &Table<IssueRow>,
) -> Vec<ProjectSummary> {
    let mut contributors: BTreeMap<&str, HashSet<&str>> = BTreeMap::new();
    let mut by_project: BTreeMap<&str, ProjectSummary> = projects
        .iter()
        .map(|p| {
            (
                p.as_str(),
                ProjectSummary {
                    project: p.clone(),
                    commits: 0,
                    issues: 0,
                    additions: 0,
                    deletions: 0,
                    contributors: 0,
                },
            )
        })
        .collect();

    for row in commits {
        if let Some(entry) = by_project.get_mut(row.project.as_str()) {
            entry.commits += 1;
            entry.additions += row.commit.additions;
            entry.deletions += row.commit.deletions;
            if !row.user.is_empty() {
                contributors
                    .entry(row.project.as_str())
                    .or_default()
                    .insert(row.user.as_str());
            }
        }
    }
    for row in issues {
        if let Some(entry) = by_project.get_mut(row.project.as_str()) {
            entry.issues += 1;
        }
    }

    let mut seen = HashSet::new();
    projects
        .iter()
        .filter(|p| seen.insert(p.as_str()))
        .filter_map(|p| by_project.remove(p.as_str()))
        .map(|mut s| {
            s.contributors = contributors.get(s.project.as_str()).map_or(0, HashSet::len);
            s
        })
        .collect()
}

fn output_json<R: Serialize>(rows: Vec<R>, options: &AggregateOptions) -> anyhow::Result<()> {
    let output = TableOutput {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        since: options.since,
        update: options.update,
        rows,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn output_ndjson<R: Serialize>(rows: &[R]) -> anyhow::Result<()> {
    for row in rows {
        println!("{}", serde_json::to_string(row)?);
    }
    Ok(())
}

fn output_summary_table(summaries: &[ProjectSummary]) {
    println!(
        "{:<40} {:>8} {:>8} {:>10} {:>10} {:>8}",
        style("Project").bold(),
        style("Commits").bold(),
        style("Issues").bold(),
        style("Added").bold(),
        style("Deleted").bold(),
        style("Authors").bold()
    );
    println!("{}", "─".repeat(89));
    for s in summaries {
        println!(
            "{:<40} {:>8} {:>8} {:>10} {:>10} {:>8}",
            truncate(&s.project, 40),
            s.commits,
            s.issues,
            style(s.additions).green(),
            style(s.deletions).red(),
            s.contributors
        );
    }

    let total_commits: usize = summaries.iter().map(|s| s.commits).sum();
    let total_issues: usize = summaries.iter().map(|s| s.issues).sum();
    println!();
    println!("Projects: {}", style(summaries.len()).cyan());
    println!("Total commits: {}", style(total_commits).cyan());
    println!("Total issues: {}", style(total_issues).cyan());
}

fn output_commit_table(commits: &Table<CommitRow>) {
    println!(
        "{:>6} {:<30} {:<10} {:<20} {:>8} {:>8}",
        style("#").bold(),
        style("Project").bold(),
        style("Commit").bold(),
        style("User").bold(),
        style("Added").bold(),
        style("Deleted").bold()
    );
    println!("{}", "─".repeat(87));
    for row in commits.iter().take(50) {
        println!(
            "{:>6} {:<30} {:<10} {:<20} {:>8} {:>8}",
            row.index,
            truncate(&row.project, 30),
            truncate(&row.commit.sha, 10),
            truncate(&row.user, 20),
            row.commit.additions,
            row.commit.deletions
        );
    }
    if commits.len() > 50 {
        println!("\n... and {} more commits", commits.len() - 50);
    }
    println!("\nUse --json or --ndjson flags to export the raw data.");
}

fn output_issue_table(issues: &Table<IssueRow>) {
    println!(
        "{:>6} {:<30} {:>7} {:<20} {:<12} {:<8}",
        style("#").bold(),
        style("Project").bold(),
        style("Number").bold(),
        style("Author").bold(),
        style("Opened").bold(),
        style("State").bold()
    );
    println!("{}", "─".repeat(88));
    for row in issues.iter().take(50) {
        println!(
            "{:>6} {:<30} {:>7} {:<20} {:<12} {:<8}",
            row.index,
            truncate(&row.project, 30),
            row.issue.number,
            truncate(&row.author, 20),
            row.issue.created_at.format("%Y-%m-%d"),
            row.issue.state
        );
    }
    if issues.len() > 50 {
        println!("\n... and {} more issues", issues.len() - 50);
    }
    println!("\nUse --json or --ndjson flags to export the raw data.");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CommitRecord, IssueRecord};
    use chrono::TimeZone;

    fn commit_row(project: &str, user: &str, additions: u64) -> CommitRow {
        CommitRow {
            index: 0,
            project: project.to_string(),
            user: user.to_string(),
            commit: CommitRecord {
                sha: "0".repeat(40),
                additions,
                deletions: 1,
                author: None,
                author_name: String::new(),
                author_email: String::new(),
                date: None,
                message: String::new(),
            },
        }
    }

    fn issue_row(project: &str) -> IssueRow {
        IssueRow {
            index: 0,
            project: project.to_string(),
            author: String::new(),
            issue: IssueRecord {
                number: 1,
                title: String::new(),
                state: "open".to_string(),
                created_at: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
                closed_at: None,
                user: None,
                is_pull_request: false,
            },
        }
    }

    #[test]
    fn summarize_keeps_list_order_and_counts_contributors() {
        let projects = vec!["b/two".to_string(), "a/one".to_string(), "b/two".to_string()];
        let commits = Table::from_batches(vec![
            vec![commit_row("a/one", "mona", 5), commit_row("a/one", "mona", 3)],
            vec![commit_row("b/two", "", 7), commit_row("b/two", "hubot", 1)],
        ]);
        let issues = Table::from_batches(vec![vec![issue_row("a/one")]]);

        let summaries = summarize(&projects, &commits, &issues);

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].project, "b/two");
        assert_eq!(summaries[0].commits, 2);
        assert_eq!(summaries[0].additions, 8);
        assert_eq!(summaries[0].contributors, 1);
        assert_eq!(summaries[1].project, "a/one");
        assert_eq!(summaries[1].issues, 1);
        assert_eq!(summaries[1].deletions, 2);
        assert_eq!(summaries[1].contributors, 1);
    }
}
