//! Run summary reporting, as a GitHub Actions issue comment when running in CI.

use std::path::Path;

use log::{error, info, warn};
use serde::Deserialize;

use crate::{
    cli::RepositoryTarget,
    error::{ConfigError, MigrateError, Result},
    provider::IssueReporter,
    sync::RunSummary,
};

#[derive(Debug, Deserialize)]
struct IssueEvent {
    issue: Option<EventIssue>,
}

#[derive(Debug, Deserialize)]
struct EventIssue {
    number: u64,
}

/// Where the summary comment goes.
#[derive(Clone, Debug, PartialEq)]
pub struct CiContext {
    pub repository: RepositoryTarget,
    pub issue_number: u64,
}

impl CiContext {
    pub fn from_env(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self> {
        let repository = lookup("GITHUB_REPOSITORY")
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::Missing("GITHUB_REPOSITORY"))?;
        let repository = RepositoryTarget::resolve(&repository, None)?;

        let event_path = lookup("GITHUB_EVENT_PATH")
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::Missing("GITHUB_EVENT_PATH"))?;

        Ok(CiContext {
            repository,
            issue_number: issue_number(Path::new(&event_path))?,
        })
    }
}

fn issue_number(event_path: &Path) -> Result<u64> {
    let content =
        std::fs::read_to_string(event_path).map_err(|error| MigrateError::io(event_path, error))?;
    let event: IssueEvent = serde_json::from_str(&content)?;

    event
        .issue
        .map(|issue| issue.number)
        .ok_or_else(|| ConfigError::Missing("issue.number").into())
}

pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

pub fn is_ci(lookup: &dyn Fn(&str) -> Option<String>) -> bool {
    lookup("CI").as_deref() == Some("true") && lookup("GITHUB_ACTIONS").as_deref() == Some("true")
}

pub fn summary_table(summary: &RunSummary) -> String {
    let mut table = format!(
        "| No. of Releases | Succeeded | Failed |\n\
         | --------------- | --------- | ------ |\n\
         | {} | {} | {} |",
        summary.total,
        summary.succeeded(),
        summary.failed
    );

    if summary.asset_failures > 0 {
        table.push_str(&format!(
            "\n\n{} asset transfer(s) failed, see the workflow logs for details.",
            summary.asset_failures
        ));
    }

    table
}

/// Comments on the triggering issue in CI, otherwise logs the totals. Never fails the run.
pub async fn publish<R: IssueReporter>(
    summary: &RunSummary,
    reporter: &R,
    lookup: &dyn Fn(&str) -> Option<String>,
) {
    if !is_ci(lookup) {
        log_totals(summary);
        return;
    }

    let context = match CiContext::from_env(lookup) {
        Ok(context) => context,
        Err(error) => {
            error!("Could not read the GitHub Actions context: {}", error);
            log_totals(summary);
            return;
        }
    };

    match reporter
        .comment_on_issue(&context.repository, context.issue_number, &summary_table(summary))
        .await
    {
        Ok(()) => info!(
            "Posted summary to {}#{}",
            context.repository, context.issue_number
        ),
        Err(error) => error!(
            "Error commenting on issue {}#{}: {}",
            context.repository, context.issue_number, error
        ),
    }
}

fn log_totals(summary: &RunSummary) {
    info!(
        "Total releases: {}, succeeded: {}, failed: {}, skipped: {}",
        summary.total,
        summary.succeeded(),
        summary.failed,
        summary.skipped
    );
    if summary.asset_failures > 0 {
        warn!("{} asset transfers failed", summary.asset_failures);
    }
}
