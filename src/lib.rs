//! Commit and issue metadata for a list of GitHub projects.
//!
//! [`aggregate::get_project_info`] walks a project list, pulls each project's
//! commits and issues through a [`provider::MetadataProvider`], drops
//! oversized commits and old issues, and returns two combined tables.

pub mod aggregate;
pub mod cache;
pub mod cli;
pub mod error;
pub mod github;
pub mod model;
pub mod projects;
pub mod provider;
pub mod report;
pub mod util;

pub use aggregate::{
    aggregate_projects, get_project_info, get_project_info_with_output, AggregateOptions,
};
pub use error::{HacktrackError, Result};
pub use provider::MetadataProvider;
