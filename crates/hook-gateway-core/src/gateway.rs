//! # Webhook Gateway
//!
//! Orchestrates a single delivery: parse, classify, dispatch, respond.
//!
//! Each request produces exactly one [`WebhookResponse`]. Failures never
//! escape as errors; they are logged and mapped to a 500 response whose body
//! names the failing step.

use crate::classifier::{classify, Route, UnroutableReason};
use crate::event::Event;
use crate::handlers::{GeneralEventHandler, HandlerError, InstallationHandler};
use crate::retry::{retry_notify, BackoffError, RetryError, RetryPolicy};
use crate::shutdown::ShutdownSignal;
use crate::webhook::{ParseError, SecretProvider, WebhookParser, WebhookRequest};
use std::sync::Arc;
use tracing::{error, field, info, info_span, warn, Instrument, Span};

// ============================================================================
// Response
// ============================================================================

/// Outcome of a delivery as seen by the sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookResponse {
    /// 200, body `OK`
    Ok,

    /// 500, body `500 Internal Server Error: <message>`
    Failed { message: String },
}

impl WebhookResponse {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    /// HTTP status code for this response
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::Failed { .. } => 500,
        }
    }

    /// Plain-text response body
    pub fn body(&self) -> String {
        match self {
            Self::Ok => "OK".to_string(),
            Self::Failed { message } => format!("500 Internal Server Error: {}", message),
        }
    }
}

impl From<GatewayError> for WebhookResponse {
    fn from(error: GatewayError) -> Self {
        Self::failed(error.to_string())
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Every way a delivery can fail.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Read Body: {0}")]
    ReadBody(String),

    #[error("Failed to parse webhook: {0}")]
    Parse(#[from] ParseError),

    #[error("No webhook could be parsed")]
    NoEvent,

    #[error("{0}")]
    Unroutable(UnroutableReason),

    #[error("{0}")]
    InstallationHandler(#[source] HandlerError),

    #[error("{0}")]
    Dispatch(#[from] RetryError<HandlerError>),
}

// ============================================================================
// Gateway
// ============================================================================

/// Entry point for webhook deliveries.
///
/// Holds no per-request state; one instance is shared by all requests.
#[derive(Clone)]
pub struct WebhookGateway {
    parser: Arc<dyn WebhookParser>,
    secrets: Arc<dyn SecretProvider>,
    installation_handler: Arc<dyn InstallationHandler>,
    general_handler: Arc<dyn GeneralEventHandler>,
    retry_policy: RetryPolicy,
}

impl WebhookGateway {
    pub fn new(
        parser: Arc<dyn WebhookParser>,
        secrets: Arc<dyn SecretProvider>,
        installation_handler: Arc<dyn InstallationHandler>,
        general_handler: Arc<dyn GeneralEventHandler>,
    ) -> Self {
        Self {
            parser,
            secrets,
            installation_handler,
            general_handler,
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Replace the retry policy used for general events
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Process one delivery and produce its response.
    ///
    /// `shutdown` aborts a pending backoff; the request then fails with 500.
    pub async fn handle(&self, request: &WebhookRequest, shutdown: ShutdownSignal) -> WebhookResponse {
        match self.process(request, shutdown).await {
            Ok(()) => WebhookResponse::Ok,
            Err(e) => e.into(),
        }
    }

    async fn process(
        &self,
        request: &WebhookRequest,
        shutdown: ShutdownSignal,
    ) -> Result<(), GatewayError> {
        let event = match self.parse(request).await {
            Ok(event) => event,
            Err(e) => {
                error!(
                    event_type = request.event_type().unwrap_or_default(),
                    delivery_id = request.delivery_id().unwrap_or_default(),
                    error = %e,
                    "Rejecting webhook"
                );
                return Err(e);
            }
        };

        let span = info_span!(
            "webhook",
            repository = %event.repository.full_name,
            kind = event.kind(),
            action = %event.action().unwrap_or_default(),
            sender = event.sender.as_deref().unwrap_or_default(),
            delivery_id = %event.delivery_id,
            installation_id = field::Empty,
        );

        async {
            let result = self.dispatch(&event, shutdown).await;
            match &result {
                Ok(()) => info!("Webhook processed"),
                Err(e) => error!(error = %e, "Failed to process webhook"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn parse(&self, request: &WebhookRequest) -> Result<Event, GatewayError> {
        self.parser
            .parse(request, self.secrets.as_ref())
            .await?
            .ok_or(GatewayError::NoEvent)
    }

    async fn dispatch(&self, event: &Event, mut shutdown: ShutdownSignal) -> Result<(), GatewayError> {
        match classify(event) {
            Route::Unroutable(reason) => Err(GatewayError::Unroutable(reason)),

            Route::Installation(hook) => {
                Span::current().record("installation_id", hook.installation.id.as_i64());
                info!(action = %hook.action, "Handling installation hook");

                self.installation_handler
                    .on_installation(hook, event)
                    .await
                    .map_err(GatewayError::InstallationHandler)
            }

            Route::General(installation) => {
                Span::current().record("installation_id", installation.id.as_i64());

                retry_notify(
                    &self.retry_policy,
                    &mut shutdown,
                    || async move {
                        self.general_handler
                            .on_event(installation, event)
                            .await
                            .map_err(|e| {
                                if e.is_transient() {
                                    BackoffError::Transient(e)
                                } else {
                                    BackoffError::Permanent(e)
                                }
                            })
                    },
                    |error, delay| {
                        warn!(
                            error = %error,
                            delay_ms = delay.as_millis() as u64,
                            "Handler failed, backing off"
                        )
                    },
                )
                .await
                .map_err(GatewayError::from)
            }
        }
    }
}

#[cfg(test)]
#[path = "gateway_tests.rs"]
mod tests;
