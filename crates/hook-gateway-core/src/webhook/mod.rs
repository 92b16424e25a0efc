//! # Webhook Module
//!
//! Inbound request representation and the parser capability that turns a
//! request into a typed [`Event`](crate::Event).
//!
//! The gateway is agnostic of the wire format: it hands a [`WebhookRequest`]
//! and a [`SecretProvider`] to a [`WebhookParser`] and acts on the result.

use crate::signature::SignatureError;
use crate::Event;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;

pub mod github_parser;

/// Event type header
pub const EVENT_HEADER: &str = "x-github-event";

/// Delivery identifier header
pub const DELIVERY_HEADER: &str = "x-github-delivery";

/// HMAC-SHA256 signature header
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

// ============================================================================
// Request
// ============================================================================

/// Raw HTTP request data handed to the parser.
///
/// Header names are stored lowercase. The body is the fully buffered request
/// body; cloning the request shares the buffer instead of copying it.
#[derive(Debug, Clone, Default)]
pub struct WebhookRequest {
    headers: HashMap<String, String>,
    body: Bytes,
}

impl WebhookRequest {
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Build from header pairs; names are normalised to lowercase
    pub fn from_parts<I, K, V>(headers: I, body: impl Into<Bytes>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let headers = headers
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_ascii_lowercase(), v.into()))
            .collect();
        Self {
            headers,
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Get event type from headers
    pub fn event_type(&self) -> Option<&str> {
        self.header(EVENT_HEADER)
    }

    /// Get delivery ID from headers
    pub fn delivery_id(&self) -> Option<&str> {
        self.header(DELIVERY_HEADER)
    }

    /// Get signature from headers if present
    pub fn signature(&self) -> Option<&str> {
        self.header(SIGNATURE_HEADER)
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

// ============================================================================
// Secrets
// ============================================================================

/// Error type for secret lookups
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("Secret provider unavailable: {0}")]
    ProviderUnavailable(String),
}

/// Source of webhook secrets.
#[async_trait]
pub trait SecretProvider: Send + Sync {
    /// Secret used to verify deliveries of `event_type`.
    ///
    /// An empty string means verification is disabled.
    async fn webhook_secret(&self, event_type: &str) -> Result<String, SecretError>;
}

/// Secret provider returning a single configured value for every event type.
#[derive(Clone, Default)]
pub struct LiteralSecretProvider {
    secret: String,
}

impl LiteralSecretProvider {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

// Never print the secret
impl std::fmt::Debug for LiteralSecretProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiteralSecretProvider")
            .field("secret", &"<REDACTED>")
            .finish()
    }
}

#[async_trait]
impl SecretProvider for LiteralSecretProvider {
    async fn webhook_secret(&self, _event_type: &str) -> Result<String, SecretError> {
        Ok(self.secret.clone())
    }
}

// ============================================================================
// Parser
// ============================================================================

/// Why a request could not be parsed. Always terminal.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    #[error("invalid signature: {0}")]
    InvalidSignature(#[from] SignatureError),

    #[error("secret lookup failed: {0}")]
    Secret(#[from] SecretError),

    #[error("malformed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    #[error("unsupported event type: {0}")]
    UnsupportedEvent(String),
}

/// Converts a raw request into a typed event.
///
/// `Ok(None)` means the request was well-formed but yielded no webhook; the
/// gateway treats it as a failure distinct from a parse error.
#[async_trait]
pub trait WebhookParser: Send + Sync {
    async fn parse(
        &self,
        request: &WebhookRequest,
        secrets: &dyn SecretProvider,
    ) -> Result<Option<Event>, ParseError>;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
