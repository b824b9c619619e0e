use crate::aggregate::AggregateOptions;
use crate::model::{parse_date, DEFAULT_SINCE};
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hacktrack")]
#[command(about = "Commit and issue metadata for a list of GitHub projects")]
#[command(version)]
pub struct Cli {
    #[clap(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone)]
pub struct CommonArgs {
    #[arg(long, help = "CSV file with user and repo columns [default: <data-dir>/projects.csv]")]
    pub projects: Option<PathBuf>,

    #[arg(long, env = "HACKTRACK_DATA_DIR", help = "Directory holding the project list and cache")]
    pub data_dir: Option<PathBuf>,

    #[arg(long, default_value = DEFAULT_SINCE, help = "Only keep issues opened after this date (YYYY-MM-DD)")]
    pub since: String,

    #[arg(long, help = "Query GitHub and refresh the cache instead of reading it")]
    pub update: bool,

    #[arg(long, short, help = "Suppress per-project progress lines")]
    pub quiet: bool,

    #[arg(long, help = "Enable debug logging")]
    pub debug: bool,
}

impl CommonArgs {
    pub fn options(&self) -> Result<AggregateOptions> {
        Ok(AggregateOptions {
            project_list: self.projects.clone(),
            data_dir: self.data_dir.clone(),
            since: parse_date(&self.since)?,
            update: self.update,
            verbose: !self.quiet,
        })
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Per-project commit and issue counts
    Summary {
        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
    /// Filtered commits of every project
    Commits {
        #[arg(long, help = "Output as JSON")]
        json: bool,

        #[arg(long, help = "Output as NDJSON")]
        ndjson: bool,
    },
    /// Filtered issues of every project
    Issues {
        #[arg(long, help = "Output as JSON")]
        json: bool,

        #[arg(long, help = "Output as NDJSON")]
        ndjson: bool,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn execute(self) -> Result<()> {
        match self.command {
            Commands::Summary { json } => crate::report::summary(&self.common, json),
            Commands::Commits { json, ndjson } => crate::report::commits(&self.common, json, ndjson),
            Commands::Issues { json, ndjson } => crate::report::issues(&self.common, json, ndjson),
        }
    }
}
