//! GitHub webhook parser.
//!
//! Verifies the `X-Hub-Signature-256` header and deserialises the JSON body
//! into the typed [`Event`] model. Only the fields the gateway routes on are
//! extracted; the raw body travels with the event untouched.

use super::{ParseError, SecretProvider, WebhookParser, WebhookRequest};
use crate::event::{
    ActivityHook, ActivityKind, Event, InstallationAction, InstallationHook, InstallationRef,
    Webhook,
};
use crate::{signature, DeliveryId, InstallationId, Repository};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

/// Parser for deliveries sent by GitHub.
#[derive(Debug, Clone, Default)]
pub struct GithubWebhookParser;

impl GithubWebhookParser {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl WebhookParser for GithubWebhookParser {
    async fn parse(
        &self,
        request: &WebhookRequest,
        secrets: &dyn SecretProvider,
    ) -> Result<Option<Event>, ParseError> {
        let event_type = request
            .event_type()
            .filter(|v| !v.is_empty())
            .ok_or(ParseError::MissingHeader("X-GitHub-Event"))?;

        let secret = secrets.webhook_secret(event_type).await?;
        if secret.is_empty() {
            warn!(
                event_type = %event_type,
                "No webhook secret configured, skipping signature verification"
            );
        } else {
            let header = request
                .signature()
                .ok_or(ParseError::MissingHeader("X-Hub-Signature-256"))?;
            signature::verify(&secret, request.body(), header)?;
        }

        if request.body().is_empty() {
            debug!(event_type = %event_type, "Empty webhook body");
            return Ok(None);
        }

        let delivery_id = DeliveryId::new(request.delivery_id().unwrap_or_default());
        let payload = request.body().clone();

        let event = if event_type == "installation" {
            let raw: RawInstallationPayload = serde_json::from_slice(&payload)?;
            Event {
                webhook: Webhook::Installation(raw.hook()),
                repository: Repository::default(),
                sender: raw.sender.map(|s| s.login),
                delivery_id,
                payload,
            }
        } else {
            let kind = ActivityKind::from_event_type(event_type)
                .ok_or_else(|| ParseError::UnsupportedEvent(event_type.to_string()))?;
            let raw: RawActivityPayload = serde_json::from_slice(&payload)?;
            let installation = raw.installation_ref();
            Event {
                webhook: Webhook::Activity(ActivityHook {
                    kind,
                    action: raw.action,
                    installation,
                }),
                repository: raw.repository.map(RawRepository::into_repository).unwrap_or_default(),
                sender: raw.sender.map(|s| s.login),
                delivery_id,
                payload,
            }
        };

        Ok(Some(event))
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct RawAccount {
    #[serde(default)]
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    login: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawInstallation {
    #[serde(default)]
    id: i64,
    #[serde(default)]
    account: Option<RawAccount>,
}

#[derive(Debug, Default, Deserialize)]
struct RawRepository {
    #[serde(default)]
    full_name: String,
    #[serde(default)]
    clone_url: String,
    #[serde(default)]
    html_url: String,
    #[serde(default)]
    owner: Option<RawAccount>,
}

impl RawRepository {
    fn into_repository(self) -> Repository {
        Repository::new(self.full_name, self.clone_url, self.html_url)
    }
}

#[derive(Debug, Deserialize)]
struct RawRepositoryName {
    full_name: String,
}

#[derive(Debug, Deserialize)]
struct RawInstallationPayload {
    action: InstallationAction,
    // A missing installation becomes ID 0, which the classifier rejects
    #[serde(default)]
    installation: RawInstallation,
    #[serde(default)]
    repositories: Vec<RawRepositoryName>,
    #[serde(default)]
    sender: Option<RawUser>,
}

impl RawInstallationPayload {
    fn hook(&self) -> InstallationHook {
        let owner_url = self
            .installation
            .account
            .as_ref()
            .map(|a| a.html_url.clone())
            .unwrap_or_default();

        InstallationHook {
            action: self.action,
            installation: InstallationRef::new(
                InstallationId::new(self.installation.id),
                owner_url,
            ),
            repositories: self
                .repositories
                .iter()
                .map(|r| r.full_name.clone())
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawActivityPayload {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    installation: Option<RawInstallation>,
    #[serde(default)]
    repository: Option<RawRepository>,
    #[serde(default)]
    sender: Option<RawUser>,
}

impl RawActivityPayload {
    /// Owner URL prefers the repository owner, then the installation account.
    fn installation_ref(&self) -> Option<InstallationRef> {
        let installation = self.installation.as_ref()?;

        let owner_url = self
            .repository
            .as_ref()
            .and_then(|r| r.owner.as_ref())
            .or(installation.account.as_ref())
            .map(|a| a.html_url.clone())
            .unwrap_or_default();

        Some(InstallationRef::new(
            InstallationId::new(installation.id),
            owner_url,
        ))
    }
}

#[cfg(test)]
#[path = "github_parser_tests.rs"]
mod tests;
