//! Tests for webhook request and secret types.

use super::*;

#[test]
fn test_headers_are_case_insensitive() {
    let request = WebhookRequest::from_parts(
        [
            ("X-GitHub-Event", "push"),
            ("X-GitHub-Delivery", "abc-123"),
            ("X-Hub-Signature-256", "sha256=00"),
        ],
        "{}",
    );

    assert_eq!(request.event_type(), Some("push"));
    assert_eq!(request.delivery_id(), Some("abc-123"));
    assert_eq!(request.signature(), Some("sha256=00"));
    assert_eq!(request.header("x-github-EVENT"), Some("push"));
}

#[test]
fn test_missing_headers_are_none() {
    let request = WebhookRequest::new("{}");

    assert_eq!(request.event_type(), None);
    assert_eq!(request.delivery_id(), None);
    assert_eq!(request.signature(), None);
}

#[test]
fn test_clone_shares_body_buffer() {
    let request = WebhookRequest::new(Bytes::from_static(b"{\"a\":1}"));
    let clone = request.clone();

    assert_eq!(request.body().as_ptr(), clone.body().as_ptr());
    assert_eq!(request.body(), clone.body());
}

#[tokio::test]
async fn test_literal_provider_returns_secret_for_any_event() {
    let provider = LiteralSecretProvider::new("top-secret");

    assert_eq!(provider.webhook_secret("push").await.unwrap(), "top-secret");
    assert_eq!(
        provider.webhook_secret("installation").await.unwrap(),
        "top-secret"
    );
}

#[test]
fn test_literal_provider_debug_redacts_secret() {
    let provider = LiteralSecretProvider::new("top-secret");
    let debug = format!("{:?}", provider);

    assert!(!debug.contains("top-secret"));
    assert!(debug.contains("REDACTED"));
}
