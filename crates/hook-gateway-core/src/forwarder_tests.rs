//! Tests for workspace forwarding.

use super::*;
use crate::event::{ActivityHook, ActivityKind, Webhook};
use crate::tenant::TenantError;
use crate::{DeliveryId, InstallationId, Repository};
use bytes::Bytes;
use std::sync::Mutex;
use wiremock::matchers::{body_bytes, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAYLOAD: &[u8] = br#"{"ref":"refs/heads/main","installation":{"id":777}}"#;

struct StaticTenant {
    workspaces: Vec<WorkspaceAccess>,
    lookups: Mutex<Vec<(InstallationId, String)>>,
}

impl StaticTenant {
    fn new(workspaces: Vec<WorkspaceAccess>) -> Arc<Self> {
        Arc::new(Self {
            workspaces,
            lookups: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl TenantService for StaticTenant {
    async fn install_app(&self, _id: InstallationId, _owner_url: &str) -> Result<(), TenantError> {
        Ok(())
    }

    async fn uninstall_app(&self, _id: InstallationId) -> Result<(), TenantError> {
        Ok(())
    }

    async fn find_workspaces(
        &self,
        id: InstallationId,
        git_url: &str,
    ) -> Result<Vec<WorkspaceAccess>, TenantError> {
        self.lookups
            .lock()
            .unwrap()
            .push((id, git_url.to_string()));
        Ok(self.workspaces.clone())
    }
}

fn workspace(server: &MockServer, project: &str, token: &str) -> WorkspaceAccess {
    WorkspaceAccess {
        project: project.to_string(),
        lighthouse_url: format!("{}/hook/{}", server.uri(), project),
        hmac_token: token.to_string(),
    }
}

fn push_event() -> (InstallationRef, Event) {
    let installation = InstallationRef::new(InstallationId::new(777), "https://github.com/octo");
    let event = Event {
        webhook: Webhook::Activity(ActivityHook {
            kind: ActivityKind::Push,
            action: None,
            installation: Some(installation.clone()),
        }),
        repository: Repository::new(
            "octo/widgets",
            "https://github.com/octo/widgets.git",
            "https://github.com/octo/widgets",
        ),
        sender: None,
        delivery_id: DeliveryId::new("delivery-9"),
        payload: Bytes::from_static(PAYLOAD),
    };
    (installation, event)
}

#[tokio::test]
async fn test_looks_up_workspaces_by_clone_url() {
    let tenant = StaticTenant::new(Vec::new());
    let forwarder = WorkspaceForwarder::new(tenant.clone(), reqwest::Client::new());
    let (installation, event) = push_event();

    forwarder.on_event(&installation, &event).await.unwrap();

    assert_eq!(
        *tenant.lookups.lock().unwrap(),
        vec![(
            InstallationId::new(777),
            "https://github.com/octo/widgets.git".to_string()
        )]
    );
}

#[tokio::test]
async fn test_forwards_raw_payload_resigned_per_workspace() {
    let server = MockServer::start().await;
    let expected_signature = signature::sign("alpha-token", PAYLOAD).unwrap();
    Mock::given(method("POST"))
        .and(path("/hook/alpha"))
        .and(header("x-github-event", "push"))
        .and(header("x-github-delivery", "delivery-9"))
        .and(header("x-hub-signature-256", expected_signature.as_str()))
        .and(body_bytes(PAYLOAD))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let tenant = StaticTenant::new(vec![workspace(&server, "alpha", "alpha-token")]);
    let forwarder = WorkspaceForwarder::new(tenant, reqwest::Client::new());
    let (installation, event) = push_event();

    forwarder.on_event(&installation, &event).await.unwrap();
}

#[tokio::test]
async fn test_unsigned_when_workspace_has_no_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook/beta"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let tenant = StaticTenant::new(vec![workspace(&server, "beta", "")]);
    let forwarder = WorkspaceForwarder::new(tenant, reqwest::Client::new());
    let (installation, event) = push_event();

    forwarder.on_event(&installation, &event).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key("x-hub-signature-256"));
}

#[tokio::test]
async fn test_forwards_to_every_workspace() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let tenant = StaticTenant::new(vec![
        workspace(&server, "alpha", "a"),
        workspace(&server, "beta", "b"),
    ]);
    let forwarder = WorkspaceForwarder::new(tenant, reqwest::Client::new());
    let (installation, event) = push_event();

    forwarder.on_event(&installation, &event).await.unwrap();
}

#[tokio::test]
async fn test_server_error_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let tenant = StaticTenant::new(vec![workspace(&server, "alpha", "")]);
    let forwarder = WorkspaceForwarder::new(tenant, reqwest::Client::new());
    let (installation, event) = push_event();

    let error = forwarder.on_event(&installation, &event).await.unwrap_err();

    assert!(matches!(
        error,
        HandlerError::Forward {
            status: Some(502),
            ..
        }
    ));
    assert!(error.is_transient());
}

#[tokio::test]
async fn test_client_error_is_permanent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let tenant = StaticTenant::new(vec![workspace(&server, "alpha", "")]);
    let forwarder = WorkspaceForwarder::new(tenant, reqwest::Client::new());
    let (installation, event) = push_event();

    let error = forwarder.on_event(&installation, &event).await.unwrap_err();

    assert!(!error.is_transient());
}

#[tokio::test]
async fn test_unreachable_workspace_is_transient() {
    let tenant = StaticTenant::new(vec![WorkspaceAccess {
        project: "gone".to_string(),
        lighthouse_url: "http://127.0.0.1:1/hook".to_string(),
        hmac_token: String::new(),
    }]);
    let forwarder = WorkspaceForwarder::new(tenant, reqwest::Client::new());
    let (installation, event) = push_event();

    let error = forwarder.on_event(&installation, &event).await.unwrap_err();

    assert!(matches!(error, HandlerError::Forward { status: None, .. }));
    assert!(error.is_transient());
}
