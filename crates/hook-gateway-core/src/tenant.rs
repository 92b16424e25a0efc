//! # Tenant Service
//!
//! Client for the tenant management service that records GitHub App
//! installations and maps repositories to workspaces, plus the installation
//! handler built on top of it.

use crate::event::{Event, InstallationAction, InstallationHook};
use crate::handlers::{HandlerError, InstallationHandler};
use crate::InstallationId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument};
use url::Url;

// ============================================================================
// Types
// ============================================================================

/// Workspace that should receive events for a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceAccess {
    pub project: String,

    /// Endpoint that accepts forwarded webhooks
    #[serde(rename = "lighthouseURL")]
    pub lighthouse_url: String,

    /// Secret used to re-sign forwarded payloads; empty disables signing
    #[serde(rename = "hmacToken", default)]
    pub hmac_token: String,
}

#[derive(Debug, Serialize)]
struct InstallAppRequest<'a> {
    #[serde(rename = "ownerURL")]
    owner_url: &'a str,
}

/// Errors returned by the tenant service
#[derive(Debug, thiserror::Error)]
pub enum TenantError {
    #[error("invalid tenant service URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("failed to create HTTP client: {0}")]
    Client(String),

    #[error("request to tenant service failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("tenant service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode tenant service response: {0}")]
    Decode(String),
}

impl TenantError {
    /// Check if error is transient and should be retried
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Request(e) => !e.is_builder() && !e.is_decode(),
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::InvalidUrl(_) | Self::Client(_) | Self::Decode(_) => false,
        }
    }
}

/// Operations offered by the tenant management service.
#[async_trait]
pub trait TenantService: Send + Sync {
    /// Register an app installation for the account at `owner_url`
    async fn install_app(&self, id: InstallationId, owner_url: &str) -> Result<(), TenantError>;

    /// Remove an app installation
    async fn uninstall_app(&self, id: InstallationId) -> Result<(), TenantError>;

    /// Workspaces subscribed to the repository at `git_url`
    async fn find_workspaces(
        &self,
        id: InstallationId,
        git_url: &str,
    ) -> Result<Vec<WorkspaceAccess>, TenantError>;
}

// ============================================================================
// REST client
// ============================================================================

/// reqwest-backed [`TenantService`].
#[derive(Debug, Clone)]
pub struct TenantServiceClient {
    base_url: Url,
    http: reqwest::Client,
}

impl TenantServiceClient {
    /// Create a client for the service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `TenantError::InvalidUrl` if the URL does not parse and
    /// `TenantError::Client` if the HTTP client cannot be created.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TenantError> {
        let base_url = Url::parse(base_url)?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("hook-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TenantError::Client(e.to_string()))?;

        Ok(Self { base_url, http })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    fn installation_endpoint(&self, id: InstallationId) -> String {
        self.endpoint(&format!("/github/app/installations/{}", id))
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, TenantError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(TenantError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl TenantService for TenantServiceClient {
    #[instrument(skip(self), fields(installation_id = %id))]
    async fn install_app(&self, id: InstallationId, owner_url: &str) -> Result<(), TenantError> {
        let result = async {
            let response = self
                .http
                .post(self.installation_endpoint(id))
                .json(&InstallAppRequest { owner_url })
                .send()
                .await?;
            Self::check_status(response).await
        }
        .await;

        match result {
            Ok(_) => {
                info!(owner_url = %owner_url, "Added installation");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Failed to install app");
                Err(e)
            }
        }
    }

    #[instrument(skip(self), fields(installation_id = %id))]
    async fn uninstall_app(&self, id: InstallationId) -> Result<(), TenantError> {
        let result = async {
            let response = self
                .http
                .delete(self.installation_endpoint(id))
                .send()
                .await?;
            Self::check_status(response).await
        }
        .await;

        match result {
            Ok(_) => {
                info!("Removed installation");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Failed to uninstall app");
                Err(e)
            }
        }
    }

    #[instrument(skip(self), fields(installation_id = %id))]
    async fn find_workspaces(
        &self,
        id: InstallationId,
        git_url: &str,
    ) -> Result<Vec<WorkspaceAccess>, TenantError> {
        let installation = id.to_string();
        let result = async {
            let response = self
                .http
                .get(self.endpoint("/workspaces"))
                .query(&[("gitURL", git_url), ("installation", installation.as_str())])
                .send()
                .await?;
            let response = Self::check_status(response).await?;
            let bytes = response.bytes().await?;
            serde_json::from_slice::<Vec<WorkspaceAccess>>(&bytes)
                .map_err(|e| TenantError::Decode(e.to_string()))
        }
        .await;

        if let Err(e) = &result {
            error!(error = %e, git_url = %git_url, "Failed to find workspaces");
        }
        result
    }
}

// ============================================================================
// Installation handler
// ============================================================================

/// Records installation lifecycle changes with the tenant service.
#[derive(Clone)]
pub struct TenantInstallationHandler {
    tenant: Arc<dyn TenantService>,
}

impl TenantInstallationHandler {
    pub fn new(tenant: Arc<dyn TenantService>) -> Self {
        Self { tenant }
    }
}

#[async_trait]
impl InstallationHandler for TenantInstallationHandler {
    async fn on_installation(
        &self,
        hook: &InstallationHook,
        _event: &Event,
    ) -> Result<(), HandlerError> {
        let id = hook.installation.id;

        match hook.action {
            InstallationAction::Created => {
                self.tenant
                    .install_app(id, &hook.installation.owner_url)
                    .await?
            }
            InstallationAction::Deleted => self.tenant.uninstall_app(id).await?,
            other => {
                info!(
                    installation_id = %id,
                    action = %other,
                    "Ignoring installation action"
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "tenant_tests.rs"]
mod tests;
