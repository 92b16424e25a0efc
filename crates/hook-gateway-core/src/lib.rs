//! # Hook Gateway Core
//!
//! Core logic for the GitHub App webhook ingress: parsing signed deliveries,
//! classifying them into installation-lifecycle or repository-activity
//! events, and dispatching them to handlers with bounded retries.
//!
//! ## Architecture
//!
//! - Business logic depends only on trait abstractions ([`WebhookParser`],
//!   [`InstallationHandler`], [`GeneralEventHandler`], [`TenantService`])
//! - Concrete collaborators (GitHub parser, tenant REST client, workspace
//!   forwarder) are injected at startup
//! - Nothing survives a single request/response cycle
//!
//! ## Usage
//!
//! ```rust
//! use hook_gateway_core::{InstallationId, RetryPolicy};
//! use std::time::Duration;
//!
//! let installation = InstallationId::new(12345);
//! assert!(!installation.is_zero());
//!
//! let policy = RetryPolicy::default();
//! assert_eq!(policy.max_elapsed_time, Duration::from_secs(30));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Domain Identifier Types
// ============================================================================

/// GitHub App installation identifier.
///
/// GitHub sends installation IDs as signed 64-bit integers. A zero ID is what
/// a payload without an installation deserialises to, so it is treated as
/// "absent" by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstallationId(i64);

impl InstallationId {
    /// Create new installation ID
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get numeric value
    pub fn as_i64(&self) -> i64 {
        self.0
    }

    /// Check whether the ID is the zero placeholder
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for InstallationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Delivery identifier taken from the `X-GitHub-Delivery` header.
///
/// Only used for log correlation and handed to downstream handlers; the
/// gateway never enforces uniqueness or format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DeliveryId(String);

impl DeliveryId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeliveryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Repository the event refers to.
///
/// Installation-lifecycle events do not carry a repository, in which case
/// every field is empty.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Repository {
    pub full_name: String,
    pub clone_url: String,
    pub html_url: String,
}

impl Repository {
    /// Create new repository description
    pub fn new(
        full_name: impl Into<String>,
        clone_url: impl Into<String>,
        html_url: impl Into<String>,
    ) -> Self {
        Self {
            full_name: full_name.into(),
            clone_url: clone_url.into(),
            html_url: html_url.into(),
        }
    }
}

// ============================================================================
// Module declarations
// ============================================================================

/// Classification of parsed events into routes
pub mod classifier;

/// Parsed webhook event model
pub mod event;

/// Forwarding of repository events to tenant workspaces
pub mod forwarder;

/// Request orchestration: parse, classify, dispatch
pub mod gateway;

/// Handler capabilities invoked by the gateway
pub mod handlers;

/// Exponential backoff bounded by elapsed time
pub mod retry;

/// Cooperative cancellation for in-flight retries
pub mod shutdown;

/// HMAC-SHA256 webhook signatures
pub mod signature;

/// Tenant management service client
pub mod tenant;

/// Webhook request and parser abstractions
pub mod webhook;

// Re-export key types for convenience
pub use classifier::{classify, Route, UnroutableReason};
pub use event::{
    ActivityHook, ActivityKind, Event, InstallationAction, InstallationHook, InstallationRef,
    Webhook,
};
pub use forwarder::WorkspaceForwarder;
pub use gateway::{GatewayError, WebhookGateway, WebhookResponse};
pub use handlers::{GeneralEventHandler, HandlerError, InstallationHandler};
pub use retry::{retry_notify, BackoffError, ExponentialBackoff, RetryError, RetryPolicy};
pub use shutdown::{ShutdownSignal, ShutdownTrigger};
pub use tenant::{
    TenantError, TenantInstallationHandler, TenantService, TenantServiceClient, WorkspaceAccess,
};
pub use webhook::{
    github_parser::GithubWebhookParser, LiteralSecretProvider, ParseError, SecretError,
    SecretProvider, WebhookParser, WebhookRequest,
};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
