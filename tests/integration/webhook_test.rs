//! Inbound webhook ingestion and fan-out through the full router.

use http::StatusCode;
use serde_json::json;

use meshboard_ingest::signature;

use crate::helpers::TestApp;

#[tokio::test]
async fn signed_event_is_canonicalized_and_dispatched() {
    let app = TestApp::new().await;
    let secret = app.incoming_secret().await;

    // Enable two dispatchers but leave them unconfigured: both must
    // report suppression in their slot, never an error.
    app.store
        .update("email", |ns| {
            ns["enabled"] = json!(true);
        })
        .await
        .unwrap();
    app.store
        .update("webhooks", |ns| {
            ns["enabled"] = json!(true);
        })
        .await
        .unwrap();

    let body = br#"{"action":"serverConnect","nodename":"PC-1","ip":"10.0.0.5"}"#.to_vec();
    let sig = signature::sign(&secret, &body);
    let (status, response) = app.post_raw("/api/webhook", body, Some(&sig)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["success"], true);
    assert_eq!(response["eventType"], "device.connect");

    let results = response["results"].as_object().unwrap();
    for module in ["email", "webhooks"] {
        let slot = &results[module];
        assert_eq!(slot["handled"], false, "{module} should be suppressed");
        assert!(slot.get("error").is_none());
    }
    // Disabled modules are skipped, not reported.
    assert!(!results.contains_key("telegram"));
}

#[tokio::test]
async fn wrong_signature_is_unauthorized() {
    let app = TestApp::new().await;

    let body = br#"{"action":"serverConnect","nodename":"PC-1"}"#.to_vec();
    let sig = signature::sign("not-the-secret", &body);
    let (status, response) = app.post_raw("/api/webhook", body, Some(&sig)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(response["success"], false);
    assert_eq!(response["error"], "AUTHENTICATION_FAILED");
}

#[tokio::test]
async fn unsigned_event_is_accepted_until_auth_is_required() {
    let app = TestApp::new().await;
    let body = br#"{"action":"serverConnect","nodename":"PC-1"}"#.to_vec();

    let (status, _) = app.post_raw("/api/webhook", body.clone(), None).await;
    assert_eq!(status, StatusCode::OK);

    app.store
        .update("events", |ns| {
            ns["authRequired"] = json!(true);
        })
        .await
        .unwrap();

    let (status, _) = app.post_raw("/api/webhook", body, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signature_may_arrive_as_a_query_parameter() {
    let app = TestApp::new().await;
    app.store
        .update("events", |ns| {
            ns["authRequired"] = json!(true);
        })
        .await
        .unwrap();
    let secret = app.incoming_secret().await;

    let body = br#"{"action":"userlogin","username":"alice"}"#.to_vec();
    let sig = signature::sign(&secret, &body);
    let (status, response) = app
        .post_raw(&format!("/api/webhook?sig={sig}"), body, None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["eventType"], "user.login");
}

#[tokio::test]
async fn malformed_payload_is_a_bad_request() {
    let app = TestApp::new().await;
    let (status, response) = app
        .post_raw("/api/webhook", b"not json at all".to_vec(), None)
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["success"], false);
    assert_eq!(response["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn processed_events_are_logged() {
    let app = TestApp::new().await;
    let body = br#"{"action":"helpRequest","username":"bob","msg":"printer on fire"}"#.to_vec();
    let (status, _) = app.post_raw("/api/webhook", body, None).await;
    assert_eq!(status, StatusCode::OK);

    let settings = app.store.get("events", json!({})).await.unwrap();
    let log = settings["log"].as_array().unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0]["eventType"], "support.request");
}

#[tokio::test]
async fn failing_module_is_isolated_in_the_dispatch_report() {
    let app = TestApp::new().await;

    // Enable telegram pointing at a dead local port; its delivery
    // failure must not poison the other slots.
    app.store
        .update("telegram", |ns| {
            ns["enabled"] = json!(true);
            ns["apiBase"] = json!("http://127.0.0.1:1");
            ns["botToken"] = json!("1:unreachable");
            ns["chatIds"] = json!(["100"]);
        })
        .await
        .unwrap();

    let body = br#"{"action":"serverConnect","nodename":"PC-1"}"#.to_vec();
    let (status, response) = app.post_raw("/api/webhook", body, None).await;

    assert_eq!(status, StatusCode::OK);
    let results = response["results"].as_object().unwrap();

    // Telegram attempted delivery; the per-recipient result records the
    // failure while the webhook call as a whole still succeeds.
    assert_eq!(results["telegram"]["handled"], true);
    assert_eq!(results["telegram"]["results"][0]["success"], false);
}
