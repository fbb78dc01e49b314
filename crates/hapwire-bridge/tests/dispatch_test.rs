//! Integration tests for action dispatch: read/write resolution,
//! inconclusive fallback chains, write templating and auth policy.

mod common;

use common::MockTransport;
use hapwire_bridge::{Action, ActionConfig, AuthConfig, Dispatcher};
use hapwire_core::Error;
use serde_json::json;
use std::sync::Arc;

fn action(value: serde_json::Value) -> Action {
    let config: ActionConfig = serde_json::from_value(value).expect("action config");
    Action::from_config(&config)
}

fn dispatcher(transport: &Arc<MockTransport>) -> Dispatcher {
    Dispatcher::new(transport.clone(), None)
}

#[tokio::test]
async fn test_degenerate_get_returns_no_data_without_http() {
    let transport = MockTransport::new();
    let result = dispatcher(&transport).resolve_read(None).await.unwrap();
    assert_eq!(result, None);
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn test_constant_action_resolves_to_mapped_body() {
    let transport = MockTransport::new();
    let constant = action(json!({
        "body": "ON",
        "mappers": [{"type": "static", "parameters": {"mapping": {"ON": "1"}}}]
    }));

    let result = dispatcher(&transport)
        .resolve_read(Some(&constant))
        .await
        .unwrap();
    assert_eq!(result.as_deref(), Some("1"));
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn test_read_applies_mapper_chain_in_order() {
    let transport = MockTransport::new();
    transport.respond("http://dev/status", r#"{"state":"ON"}"#);

    let get = action(json!({
        "url": "http://dev/status",
        "mappers": [
            {"type": "jsonPath", "parameters": {"jsonPath": "$.state"}},
            {"type": "static", "parameters": {"mapping": {"ON": "1", "OFF": "0"}}}
        ]
    }));

    let result = dispatcher(&transport)
        .resolve_read(Some(&get))
        .await
        .unwrap();
    assert_eq!(result.as_deref(), Some("1"));
    assert_eq!(transport.requests()[0].method, "GET");
}

#[tokio::test]
async fn test_read_transport_failure_is_a_network_error() {
    let transport = MockTransport::new();
    transport.fail("http://dev/status");

    let get = action(json!("http://dev/status"));
    let err = dispatcher(&transport)
        .resolve_read(Some(&get))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Network(_)));
}

#[tokio::test]
async fn test_read_http_error_status_is_a_network_error() {
    let transport = MockTransport::new();
    transport.respond_with_status("http://dev/status", 500, "boom");

    let get = action(json!("http://dev/status"));
    let err = dispatcher(&transport)
        .resolve_read(Some(&get))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Network(_)));
}

#[tokio::test]
async fn test_inconclusive_resolves_fallback_without_retrying_primary() {
    let transport = MockTransport::new();
    transport.respond("http://primary/status", "inconclusive");
    transport.respond("http://secondary/status", "42");

    let get = action(json!({
        "url": "http://primary/status",
        "inconclusive": "http://secondary/status"
    }));

    let result = dispatcher(&transport)
        .resolve_read(Some(&get))
        .await
        .unwrap();
    assert_eq!(result.as_deref(), Some("42"));
    assert_eq!(transport.requests_for("http://primary/status"), 1);
    assert_eq!(transport.requests_for("http://secondary/status"), 1);
}

#[tokio::test]
async fn test_inconclusive_sentinel_produced_by_mappers() {
    let transport = MockTransport::new();
    transport.respond("http://primary/status", r#"{"state":"unknown"}"#);
    transport.respond("http://secondary/status", "7");

    let get = action(json!({
        "url": "http://primary/status",
        "mappers": [
            {"type": "jsonPath", "parameters": {"jsonPath": "$.state"}},
            {"type": "static", "parameters": {"mapping": {"unknown": "inconclusive"}}}
        ],
        "inconclusive": "http://secondary/status"
    }));

    let result = dispatcher(&transport)
        .resolve_read(Some(&get))
        .await
        .unwrap();
    assert_eq!(result.as_deref(), Some("7"));
}

#[tokio::test]
async fn test_inconclusive_chain_resolves_in_declared_order() {
    let transport = MockTransport::new();
    transport.respond("http://a/status", "inconclusive");
    transport.respond("http://b/status", "inconclusive");
    transport.respond("http://c/status", "ok");

    let get = action(json!({
        "url": "http://a/status",
        "inconclusive": {
            "url": "http://b/status",
            "inconclusive": "http://c/status"
        }
    }));

    let result = dispatcher(&transport)
        .resolve_read(Some(&get))
        .await
        .unwrap();
    assert_eq!(result.as_deref(), Some("ok"));
    assert_eq!(transport.request_count(), 3);
}

#[tokio::test]
async fn test_inconclusive_without_fallback_returns_the_literal() {
    let transport = MockTransport::new();
    transport.respond("http://dev/status", "inconclusive");

    let get = action(json!("http://dev/status"));
    let result = dispatcher(&transport)
        .resolve_read(Some(&get))
        .await
        .unwrap();
    assert_eq!(result.as_deref(), Some("inconclusive"));
}

#[tokio::test]
async fn test_write_without_action_or_url_is_a_noop() {
    let transport = MockTransport::new();
    let dispatch = dispatcher(&transport);

    dispatch.resolve_write(None, "1").await.unwrap();

    let constant = action(json!({"body": "x"}));
    dispatch.resolve_write(Some(&constant), "1").await.unwrap();

    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn test_write_maps_value_and_renders_templates() {
    let transport = MockTransport::new();
    transport.respond("http://dev/set?level=75", "ok");

    let set = action(json!({
        "url": "http://dev/set?level={value}",
        "httpMethod": "POST",
        "body": r#"{{"level": {value}, "requested": "{raw}"}}"#,
        "mappers": [{"type": "regex", "parameters": {"pattern": r"(\d+)"}}]
    }));

    dispatcher(&transport)
        .resolve_write(Some(&set), "75%")
        .await
        .unwrap();

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].url, "http://dev/set?level=75");
    assert_eq!(requests[0].body, r#"{"level": 75, "requested": "75%"}"#);
}

#[tokio::test]
async fn test_write_with_unresolved_placeholder_fails_before_http() {
    let transport = MockTransport::new();
    let set = action(json!({
        "url": "http://dev/set",
        "body": "{unknown_var}"
    }));

    let err = dispatcher(&transport)
        .resolve_write(Some(&set), "1")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Template(_)));
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn test_write_transport_failure_is_reported() {
    let transport = MockTransport::new();
    transport.fail("http://dev/set");

    let set = action(json!({"url": "http://dev/set", "httpMethod": "PUT"}));
    let err = dispatcher(&transport)
        .resolve_write(Some(&set), "1")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Network(_)));
}

#[tokio::test]
async fn test_preemptive_auth_is_sent_with_first_request() {
    let transport = MockTransport::new();
    transport.respond("http://dev/status", "1");

    let auth = AuthConfig {
        username: "admin".to_string(),
        password: "pw".to_string(),
        send_immediately: true,
    };
    let dispatch = Dispatcher::new(transport.clone(), Some(auth));

    let get = action(json!("http://dev/status"));
    dispatch.resolve_read(Some(&get)).await.unwrap();

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].auth.as_deref(), Some("admin"));
}

#[tokio::test]
async fn test_challenge_auth_retries_once_on_401() {
    let transport = MockTransport::new();
    transport.challenge("http://dev/status", "42");

    let auth = AuthConfig {
        username: "admin".to_string(),
        password: "pw".to_string(),
        send_immediately: false,
    };
    let dispatch = Dispatcher::new(transport.clone(), Some(auth));

    let get = action(json!("http://dev/status"));
    let result = dispatch.resolve_read(Some(&get)).await.unwrap();
    assert_eq!(result.as_deref(), Some("42"));

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].auth, None);
    assert_eq!(requests[1].auth.as_deref(), Some("admin"));
}
