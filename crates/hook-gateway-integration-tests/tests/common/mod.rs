//! Common test utilities for hook-gateway integration tests
//!
//! This module provides:
//! - Recording implementations of the handler traits
//! - A router factory wired with the real GitHub parser
//! - Signed request builders and payload fixtures
//! - A tracing layer counting log events by message

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use bytes::Bytes;
use hook_gateway_api::{create_router, AppState, ServiceConfig};
use hook_gateway_core::{
    signature, Event, GeneralEventHandler, GithubWebhookParser, HandlerError,
    InstallationHandler, InstallationHook, InstallationId, InstallationRef,
    LiteralSecretProvider, RetryPolicy, ShutdownSignal, WebhookGateway,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

pub const SECRET: &str = "integration-secret";

// ============================================================================
// Recording handlers
// ============================================================================

/// Installation handler recording every hook it receives
#[derive(Default)]
pub struct RecordingInstallationHandler {
    calls: Mutex<Vec<InstallationHook>>,
}

impl RecordingInstallationHandler {
    pub fn installation_ids(&self) -> Vec<InstallationId> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|h| h.installation.id)
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl InstallationHandler for RecordingInstallationHandler {
    async fn on_installation(
        &self,
        hook: &InstallationHook,
        _event: &Event,
    ) -> Result<(), HandlerError> {
        self.calls.lock().unwrap().push(hook.clone());
        Ok(())
    }
}

/// General handler failing a scripted number of times before succeeding
#[derive(Default)]
pub struct RecordingGeneralHandler {
    calls: Mutex<Vec<(InstallationId, Bytes)>>,
    failures: Mutex<VecDeque<HandlerError>>,
}

impl RecordingGeneralHandler {
    pub fn failing_times(n: usize) -> Self {
        let failures = (1..=n)
            .map(|i| HandlerError::transient(format!("workspace unavailable ({i})")))
            .collect();
        Self {
            failures: Mutex::new(failures),
            ..Self::default()
        }
    }

    pub fn installation_ids(&self) -> Vec<InstallationId> {
        self.calls.lock().unwrap().iter().map(|(id, _)| *id).collect()
    }

    pub fn payloads(&self) -> Vec<Bytes> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl GeneralEventHandler for RecordingGeneralHandler {
    async fn on_event(
        &self,
        installation: &InstallationRef,
        event: &Event,
    ) -> Result<(), HandlerError> {
        self.calls
            .lock()
            .unwrap()
            .push((installation.id, event.payload.clone()));
        match self.failures.lock().unwrap().pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

// ============================================================================
// Application factory
// ============================================================================

pub struct TestApp {
    pub router: Router,
    pub installation: Arc<RecordingInstallationHandler>,
    pub general: Arc<RecordingGeneralHandler>,
}

/// Router backed by the real GitHub parser and recording handlers
pub fn test_app(general: RecordingGeneralHandler) -> TestApp {
    let installation = Arc::new(RecordingInstallationHandler::default());
    let general = Arc::new(general);

    let gateway = WebhookGateway::new(
        Arc::new(GithubWebhookParser::new()),
        Arc::new(LiteralSecretProvider::new(SECRET)),
        installation.clone(),
        general.clone(),
    )
    .with_retry_policy(RetryPolicy::default());

    let state = AppState::new(ServiceConfig::default(), gateway, ShutdownSignal::never());

    TestApp {
        router: create_router(state),
        installation,
        general,
    }
}

// ============================================================================
// Requests and payloads
// ============================================================================

/// POST request signed with [`SECRET`]
pub fn signed_request(event_type: &str, body: &[u8]) -> Request<Body> {
    let signature = signature::sign(SECRET, body).unwrap();
    Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .header("X-GitHub-Event", event_type)
        .header("X-GitHub-Delivery", uuid::Uuid::new_v4().to_string())
        .header("X-Hub-Signature-256", signature)
        .body(Body::from(body.to_vec()))
        .unwrap()
}

pub fn installation_payload(action: &str, id: i64) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "action": action,
        "installation": {
            "id": id,
            "account": { "login": "octo", "html_url": "https://github.com/octo" }
        },
        "repositories": [{ "id": 1, "full_name": "octo/widgets" }],
        "sender": { "login": "octocat" }
    }))
    .unwrap()
}

pub fn push_payload(installation_id: Option<i64>) -> Vec<u8> {
    let mut payload = serde_json::json!({
        "ref": "refs/heads/main",
        "after": "0d1a26e67d8f5eaf1f6ba5c57fc3c7d91ac0fd1c",
        "repository": {
            "full_name": "octo/widgets",
            "clone_url": "https://github.com/octo/widgets.git",
            "html_url": "https://github.com/octo/widgets",
            "owner": { "login": "octo", "html_url": "https://github.com/octo" }
        },
        "sender": { "login": "octocat" }
    });
    if let Some(id) = installation_id {
        payload["installation"] = serde_json::json!({ "id": id });
    }
    serde_json::to_vec(&payload).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// ============================================================================
// Log capture
// ============================================================================

/// Tracing layer counting events whose message contains a needle
#[derive(Clone)]
pub struct MessageCounter {
    needle: &'static str,
    count: Arc<Mutex<usize>>,
}

impl MessageCounter {
    pub fn new(needle: &'static str) -> Self {
        Self {
            needle,
            count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn count(&self) -> usize {
        *self.count.lock().unwrap()
    }
}

struct MessageVisitor(Option<String>);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = Some(format!("{:?}", value));
        }
    }
}

impl<S: tracing::Subscriber> Layer<S> for MessageCounter {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor(None);
        event.record(&mut visitor);
        if visitor
            .0
            .as_deref()
            .is_some_and(|message| message.contains(self.needle))
        {
            *self.count.lock().unwrap() += 1;
        }
    }
}
