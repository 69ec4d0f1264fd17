//! End-to-end checks of the request gate.

use std::sync::Arc;

use edge_guard::audit::SecurityEventKind;
use edge_guard::http::FunctionHandler;
use reqwest::StatusCode;

mod common;

#[tokio::test]
async fn test_valid_request_reaches_handler() {
    let server = common::start_server(common::test_config()).await;

    let res = server
        .client
        .post(server.url("/functions/analysis"))
        .header("content-type", "application/json")
        .header("x-request-id", "req-abc")
        .header("user-agent", "pipeline-test")
        .body(r#"{"userId":"rep-7","quarter":"Q3"}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-request-id"], "req-abc");
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["endpoint"], "analysis");
    assert_eq!(body["request_id"], "req-abc");

    let events = server.audit.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, SecurityEventKind::RequestValidated);
    assert_eq!(events[0].caller_key.as_deref(), Some("rep-7"));
    assert_eq!(events[0].details["user_agent"], "pipeline-test");
}

#[tokio::test]
async fn test_wrong_method_is_405() {
    let server = common::start_server(common::test_config()).await;

    let res = server
        .client
        .get(server.url("/functions/analysis"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(server.audit.kinds(), vec![SecurityEventKind::InvalidMethod]);
}

#[tokio::test]
async fn test_text_plain_never_reaches_limiter() {
    let mut config = common::test_config();
    config
        .rate_limit
        .endpoints
        .insert("analysis".into(), edge_guard::config::EndpointQuota::new(1, 60_000));
    let server = common::start_server(config).await;

    for _ in 0..3 {
        let res = server
            .client
            .post(server.url("/functions/analysis"))
            .header("content-type", "text/plain")
            .body("{}")
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    // The quota of one is still unused.
    let res = server.post_json("analysis", "{}").await;
    assert_eq!(res.status(), StatusCode::OK);

    let kinds = server.audit.kinds();
    assert_eq!(
        kinds,
        vec![
            SecurityEventKind::InvalidContentType,
            SecurityEventKind::InvalidContentType,
            SecurityEventKind::InvalidContentType,
            SecurityEventKind::RequestValidated,
        ]
    );
}

#[tokio::test]
async fn test_body_size_boundary() {
    let server = common::start_server(common::test_config()).await;

    let exact = format!("\"{}\"", "a".repeat(100_000 - 2));
    let res = server.post_json("verification", &exact).await;
    assert_eq!(res.status(), StatusCode::OK);

    let over = format!("\"{}\"", "a".repeat(100_000 - 1));
    let res = server.post_json("verification", &over).await;
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(!body.to_string().contains("100001"));

    let events = server.audit.events();
    let last = events.last().unwrap();
    assert_eq!(last.kind, SecurityEventKind::PayloadTooLarge);
    assert_eq!(last.details["size"], 100_001);
}

#[tokio::test]
async fn test_malformed_json_is_400_with_message() {
    let server = common::start_server(common::test_config()).await;

    let res = server.post_json("analysis", "{not json").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let events = server.audit.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, SecurityEventKind::InvalidJson);
    assert!(!events[0].details["error"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_preflight_skips_gate() {
    let server = common::start_server(common::test_config()).await;

    let res = server
        .client
        .request(reqwest::Method::OPTIONS, server.url("/functions/analysis"))
        .header("origin", "http://localhost:5173")
        .header("access-control-request-method", "POST")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["access-control-allow-origin"], "http://localhost:5173");
    assert_eq!(res.headers()["access-control-allow-methods"], "POST, OPTIONS");
    assert_eq!(res.headers()["access-control-max-age"], "86400");
    assert!(res.bytes().await.unwrap().is_empty());
    assert!(server.audit.events().is_empty());
}

#[tokio::test]
async fn test_cors_headers_on_errors() {
    let server = common::start_server(common::test_config()).await;

    let res = server
        .client
        .post(server.url("/functions/analysis"))
        .header("origin", "http://localhost:3000")
        .header("content-type", "text/plain")
        .body("{}")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.headers()["access-control-allow-origin"], "http://localhost:3000");
}

#[tokio::test]
async fn test_unknown_endpoint_is_404() {
    let server = common::start_server(common::test_config()).await;

    let res = server.post_json("does-not-exist", "{}").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert!(server.audit.events().is_empty());
}

#[tokio::test]
async fn test_forbidden_keys_never_reach_handler() {
    let server = common::start_server_with(
        common::test_config(),
        vec![("analysis", Arc::new(common::EchoHandler) as Arc<dyn FunctionHandler>)],
    )
    .await;

    let res = server
        .client
        .post(server.url("/functions/analysis"))
        .header("content-type", "application/json")
        .header("x-forwarded-for", "1.2.3.4, 5.6.7.8")
        .header("cf-connecting-ip", "9.9.9.9")
        .body(r#"{"__proto__":{"isAdmin":true},"deal":{"constructor":{},"value":1200}}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["payload"], serde_json::json!({ "deal": { "value": 1200 } }));
    assert_eq!(body["client_ip"], "1.2.3.4");
    assert_eq!(body["user_id"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_handler_sees_full_user_agent() {
    let server = common::start_server_with(
        common::test_config(),
        vec![("analysis", Arc::new(common::EchoHandler) as Arc<dyn FunctionHandler>)],
    )
    .await;
    let agent = "a".repeat(150);

    let res = server
        .client
        .post(server.url("/functions/analysis"))
        .header("content-type", "application/json")
        .header("user-agent", agent.as_str())
        .body("{}")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["user_agent"], agent.as_str());
    let audited = server.audit.events()[0].details["user_agent"].as_str().unwrap().to_string();
    assert_eq!(audited.len(), 100);
}

#[tokio::test]
async fn test_health() {
    let server = common::start_server(common::test_config()).await;

    let res = server.client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
}
