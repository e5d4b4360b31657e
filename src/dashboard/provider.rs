//! Deployment records and the provider seam the dashboard reads them through.

use crate::error::{GhdError, Result};
use async_trait::async_trait;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeploymentState {
    Error,
    Failure,
    Pending,
    InProgress,
    Queued,
    Success,
    Inactive,
}

impl DeploymentState {
    pub fn as_str(self) -> &'static str {
        match self {
            DeploymentState::Error => "error",
            DeploymentState::Failure => "failure",
            DeploymentState::Pending => "pending",
            DeploymentState::InProgress => "in_progress",
            DeploymentState::Queued => "queued",
            DeploymentState::Success => "success",
            DeploymentState::Inactive => "inactive",
        }
    }

    /// Accent used when the state is shown in a table cell.
    pub fn style(self) -> Style {
        match self {
            DeploymentState::Pending | DeploymentState::Queued => Style::default().fg(Color::Cyan),
            DeploymentState::Success => Style::default().fg(Color::Green),
            DeploymentState::Error | DeploymentState::Failure => Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
            DeploymentState::InProgress => Style::default().fg(Color::Yellow),
            DeploymentState::Inactive => Style::default().fg(Color::Blue),
        }
    }
}

impl fmt::Display for DeploymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeploymentState {
    type Err = GhdError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "error" => Ok(DeploymentState::Error),
            "failure" => Ok(DeploymentState::Failure),
            "pending" => Ok(DeploymentState::Pending),
            "in_progress" => Ok(DeploymentState::InProgress),
            "queued" => Ok(DeploymentState::Queued),
            "success" => Ok(DeploymentState::Success),
            "inactive" => Ok(DeploymentState::Inactive),
            other => Err(GhdError::provider(format!("unknown deployment state '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Deployment {
    pub id: u64,
    pub git_ref: String,
    pub environment: String,
    pub task: String,
    pub description: String,
    pub creator: String,
    pub created_at: String,
    pub transient: Option<bool>,
    pub production: Option<bool>,
    pub payload: Option<DeploymentPayload>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentStatus {
    pub id: u64,
    pub state: DeploymentState,
    pub creator: String,
    pub created_at: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    pub sha: String,
    pub author: String,
    pub date: String,
    pub message: String,
}

impl Commit {
    /// First line of the commit message.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    /// `owner/name`
    pub full_name: String,
    pub private: bool,
}

/// How a deployment moves an environment relative to what it runs now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeploymentKind {
    /// Nothing was deployed to the environment before
    Initial,
    /// The environment already runs this ref
    Redeploy,
    Rollback,
    Forward,
    /// The direction could not be worked out from the commit history
    Undefined,
}

impl DeploymentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DeploymentKind::Initial => "initial",
            DeploymentKind::Redeploy => "redeploy",
            DeploymentKind::Rollback => "rollback",
            DeploymentKind::Forward => "forward",
            DeploymentKind::Undefined => "undefined",
        }
    }
}

impl fmt::Display for DeploymentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata attached to deployments created by the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentPayload {
    pub kind: DeploymentKind,
    /// Ref the environment ran before; empty when unknown
    pub from_ref: String,
    pub to_ref: String,
}

impl DeploymentPayload {
    pub fn new(kind: DeploymentKind, from_ref: impl Into<String>, to_ref: impl Into<String>) -> Self {
        Self {
            kind,
            from_ref: from_ref.into(),
            to_ref: to_ref.into(),
        }
    }
}

/// Parameters of a deployment to create.
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentRequest {
    pub git_ref: String,
    pub environment: String,
    pub task: String,
    pub description: String,
    pub transient: bool,
    pub production: bool,
    /// Require the ref to be deployed in the previous environment first
    pub check_constraints: bool,
    /// Skip constraint checks
    pub force: bool,
    pub payload: Option<DeploymentPayload>,
}

/// Source of deployment data and sink for deploy commands.
///
/// Data calls apply to the current repository.
#[async_trait(?Send)]
pub trait DeploymentProvider {
    /// Repositories the user can deploy
    async fn list_repositories(&self) -> Result<Vec<Repository>>;

    /// `owner/name` of the current repository, if one was chosen
    fn repository(&self) -> Option<String>;

    fn set_repository(&self, full_name: &str);

    /// Deployments, newest first, optionally restricted to one environment
    async fn list_deployments(&self, environment: Option<&str>) -> Result<Vec<Deployment>>;

    async fn deployment_statuses(&self, deployment_id: u64) -> Result<Vec<DeploymentStatus>>;

    /// Recent commits of the default branch, newest first
    async fn list_commits(&self) -> Result<Vec<Commit>>;

    /// Create a deployment and return its id
    async fn create_deployment(&self, request: DeploymentRequest) -> Result<u64>;
}

/// Environment following `current` in promotion order, if any.
pub fn next_environment<'a>(order: &'a [String], current: &str) -> Option<&'a str> {
    let index = order.iter().position(|env| env == current)?;
    order.get(index + 1).map(String::as_str)
}

/// Full commit hashes are abbreviated to 7 characters; anything else is only
/// cut to `max_width`.
pub fn short_sha(git_ref: &str, max_width: usize) -> &str {
    let is_sha = git_ref.len() == 40 && git_ref.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
    let limit = if is_sha { max_width.min(7) } else { max_width };
    match git_ref.char_indices().nth(limit) {
        Some((end, _)) => &git_ref[..end],
        None => git_ref,
    }
}

/// Colored yes/no cell; unknown values show as a blue question mark.
pub fn bool_cell(value: Option<bool>) -> Span<'static> {
    match value {
        Some(true) => Span::styled("yes", Style::default().fg(Color::Green)),
        Some(false) => Span::styled("no", Style::default().fg(Color::Red)),
        None => Span::styled("?", Style::default().fg(Color::Blue)),
    }
}
