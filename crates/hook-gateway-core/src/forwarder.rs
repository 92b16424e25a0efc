//! Forwarding of repository activity to tenant workspaces.
//!
//! The tenant service knows which workspaces subscribe to a repository. Each
//! receives the original payload, re-signed with the workspace's own token.

use crate::event::{Event, InstallationRef};
use crate::handlers::{GeneralEventHandler, HandlerError};
use crate::signature;
use crate::tenant::{TenantService, WorkspaceAccess};
use crate::webhook::{DELIVERY_HEADER, EVENT_HEADER, SIGNATURE_HEADER};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// [`GeneralEventHandler`] that relays events to every subscribed workspace.
#[derive(Clone)]
pub struct WorkspaceForwarder {
    tenant: Arc<dyn TenantService>,
    http: reqwest::Client,
}

impl WorkspaceForwarder {
    pub fn new(tenant: Arc<dyn TenantService>, http: reqwest::Client) -> Self {
        Self { tenant, http }
    }

    async fn forward(&self, workspace: &WorkspaceAccess, event: &Event) -> Result<(), HandlerError> {
        let forward_error = |status: Option<u16>, message: String| HandlerError::Forward {
            target: workspace.lighthouse_url.clone(),
            status,
            message,
        };

        let mut request = self
            .http
            .post(&workspace.lighthouse_url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(EVENT_HEADER, event.kind())
            .header(DELIVERY_HEADER, event.delivery_id.as_str());

        if !workspace.hmac_token.is_empty() {
            let signature = signature::sign(&workspace.hmac_token, &event.payload)
                .map_err(|e| HandlerError::permanent(format!("failed to sign payload: {e}")))?;
            request = request.header(SIGNATURE_HEADER, signature);
        }

        // Bytes clone shares the buffer
        let response = request
            .body(event.payload.clone())
            .send()
            .await
            .map_err(|e| forward_error(None, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(forward_error(Some(status.as_u16()), body));
        }

        debug!(
            project = %workspace.project,
            status = status.as_u16(),
            "Forwarded webhook"
        );
        Ok(())
    }
}

#[async_trait]
impl GeneralEventHandler for WorkspaceForwarder {
    #[instrument(
        skip(self, installation, event),
        fields(installation_id = %installation.id, repository = %event.repository.full_name)
    )]
    async fn on_event(
        &self,
        installation: &InstallationRef,
        event: &Event,
    ) -> Result<(), HandlerError> {
        let workspaces = self
            .tenant
            .find_workspaces(installation.id, &event.repository.clone_url)
            .await?;

        if workspaces.is_empty() {
            info!(kind = event.kind(), "No workspaces subscribed to repository");
            return Ok(());
        }

        for workspace in &workspaces {
            self.forward(workspace, event).await?;
        }

        info!(
            kind = event.kind(),
            workspaces = workspaces.len(),
            "Forwarded webhook to workspaces"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "forwarder_tests.rs"]
mod tests;
