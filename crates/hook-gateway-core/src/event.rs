//! # Event Model
//!
//! Typed representation of a parsed GitHub webhook delivery.
//!
//! The set of webhook kinds is closed: [`Webhook`] distinguishes
//! installation-lifecycle hooks from repository activity, and
//! [`ActivityKind`] enumerates every activity kind the gateway accepts.
//! Adding a kind is a compile-time decision because every consumer matches
//! exhaustively.

use crate::{DeliveryId, InstallationId, Repository};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Installation Types
// ============================================================================

/// Reference to the installation an event belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallationRef {
    pub id: InstallationId,
    pub owner_url: String,
}

impl InstallationRef {
    pub fn new(id: InstallationId, owner_url: impl Into<String>) -> Self {
        Self {
            id,
            owner_url: owner_url.into(),
        }
    }
}

/// Actions reported by `installation` webhooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallationAction {
    Created,
    Deleted,
    Suspend,
    Unsuspend,
    NewPermissionsAccepted,
}

impl fmt::Display for InstallationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Deleted => "deleted",
            Self::Suspend => "suspend",
            Self::Unsuspend => "unsuspend",
            Self::NewPermissionsAccepted => "new_permissions_accepted",
        };
        write!(f, "{}", s)
    }
}

/// Installation-lifecycle hook: the app was installed, removed, suspended,
/// or had its permissions changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallationHook {
    pub action: InstallationAction,
    pub installation: InstallationRef,
    /// Full names of the repositories included in the installation
    pub repositories: Vec<String>,
}

// ============================================================================
// Activity Types
// ============================================================================

/// Repository activity kinds accepted by the gateway.
///
/// `installation_repositories` is an activity kind and is routed through the
/// installation it references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Push,
    PullRequest,
    PullRequestReview,
    PullRequestReviewComment,
    PullRequestReviewThread,
    Issues,
    IssueComment,
    CommitComment,
    Create,
    Delete,
    Release,
    Status,
    CheckRun,
    CheckSuite,
    WorkflowRun,
    WorkflowJob,
    WorkflowDispatch,
    Deployment,
    DeploymentStatus,
    Fork,
    Label,
    Milestone,
    Member,
    Repository,
    RepositoryDispatch,
    Public,
    Star,
    Watch,
    Discussion,
    DiscussionComment,
    Gollum,
    MergeGroup,
    InstallationRepositories,
    Ping,
}

impl ActivityKind {
    /// Map an `X-GitHub-Event` value to an activity kind.
    ///
    /// Returns `None` for `installation` (not an activity) and for kinds the
    /// gateway does not support.
    pub fn from_event_type(event_type: &str) -> Option<Self> {
        let kind = match event_type {
            "push" => Self::Push,
            "pull_request" => Self::PullRequest,
            "pull_request_review" => Self::PullRequestReview,
            "pull_request_review_comment" => Self::PullRequestReviewComment,
            "pull_request_review_thread" => Self::PullRequestReviewThread,
            "issues" => Self::Issues,
            "issue_comment" => Self::IssueComment,
            "commit_comment" => Self::CommitComment,
            "create" => Self::Create,
            "delete" => Self::Delete,
            "release" => Self::Release,
            "status" => Self::Status,
            "check_run" => Self::CheckRun,
            "check_suite" => Self::CheckSuite,
            "workflow_run" => Self::WorkflowRun,
            "workflow_job" => Self::WorkflowJob,
            "workflow_dispatch" => Self::WorkflowDispatch,
            "deployment" => Self::Deployment,
            "deployment_status" => Self::DeploymentStatus,
            "fork" => Self::Fork,
            "label" => Self::Label,
            "milestone" => Self::Milestone,
            "member" => Self::Member,
            "repository" => Self::Repository,
            "repository_dispatch" => Self::RepositoryDispatch,
            "public" => Self::Public,
            "star" => Self::Star,
            "watch" => Self::Watch,
            "discussion" => Self::Discussion,
            "discussion_comment" => Self::DiscussionComment,
            "gollum" => Self::Gollum,
            "merge_group" => Self::MergeGroup,
            "installation_repositories" => Self::InstallationRepositories,
            "ping" => Self::Ping,
            _ => return None,
        };
        Some(kind)
    }

    /// Get the `X-GitHub-Event` name of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::PullRequest => "pull_request",
            Self::PullRequestReview => "pull_request_review",
            Self::PullRequestReviewComment => "pull_request_review_comment",
            Self::PullRequestReviewThread => "pull_request_review_thread",
            Self::Issues => "issues",
            Self::IssueComment => "issue_comment",
            Self::CommitComment => "commit_comment",
            Self::Create => "create",
            Self::Delete => "delete",
            Self::Release => "release",
            Self::Status => "status",
            Self::CheckRun => "check_run",
            Self::CheckSuite => "check_suite",
            Self::WorkflowRun => "workflow_run",
            Self::WorkflowJob => "workflow_job",
            Self::WorkflowDispatch => "workflow_dispatch",
            Self::Deployment => "deployment",
            Self::DeploymentStatus => "deployment_status",
            Self::Fork => "fork",
            Self::Label => "label",
            Self::Milestone => "milestone",
            Self::Member => "member",
            Self::Repository => "repository",
            Self::RepositoryDispatch => "repository_dispatch",
            Self::Public => "public",
            Self::Star => "star",
            Self::Watch => "watch",
            Self::Discussion => "discussion",
            Self::DiscussionComment => "discussion_comment",
            Self::Gollum => "gollum",
            Self::MergeGroup => "merge_group",
            Self::InstallationRepositories => "installation_repositories",
            Self::Ping => "ping",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Repository activity hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityHook {
    pub kind: ActivityKind,
    pub action: Option<String>,
    pub installation: Option<InstallationRef>,
}

// ============================================================================
// Event
// ============================================================================

/// Discriminated union over the webhook variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Webhook {
    Installation(InstallationHook),
    Activity(ActivityHook),
}

/// A parsed webhook delivery.
///
/// Lives for the duration of one request. `payload` holds the exact bytes
/// received so handlers can re-deliver them unmodified.
#[derive(Debug, Clone)]
pub struct Event {
    pub webhook: Webhook,
    pub repository: Repository,
    pub sender: Option<String>,
    pub delivery_id: DeliveryId,
    pub payload: Bytes,
}

impl Event {
    /// Event kind label used for logging and forwarding
    pub fn kind(&self) -> &'static str {
        match &self.webhook {
            Webhook::Installation(_) => "installation",
            Webhook::Activity(hook) => hook.kind.as_str(),
        }
    }

    /// Action carried by the payload, if any
    pub fn action(&self) -> Option<String> {
        match &self.webhook {
            Webhook::Installation(hook) => Some(hook.action.to_string()),
            Webhook::Activity(hook) => hook.action.clone(),
        }
    }

    /// Installation reference carried by the event
    pub fn installation_ref(&self) -> Option<&InstallationRef> {
        match &self.webhook {
            Webhook::Installation(hook) => Some(&hook.installation),
            Webhook::Activity(hook) => hook.installation.as_ref(),
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
