//! Module listing, detail, settings save, actions, and reload.

use http::StatusCode;
use serde_json::{Value, json};

use crate::helpers::TestApp;

#[tokio::test]
async fn list_returns_every_builtin_module() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/api/modules").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["name"].as_str().unwrap())
        .collect();
    for expected in ["telegram", "email", "webhooks", "branding", "events"] {
        assert!(names.contains(&expected), "missing module {expected}");
    }
}

#[tokio::test]
async fn list_never_exposes_settings_or_secrets() {
    let app = TestApp::new().await;
    let (_, body) = app.get("/api/modules").await;

    for module in body["data"].as_array().unwrap() {
        assert!(module.get("settings").is_none());
        assert!(module.get("incomingSecret").is_none());
    }
}

#[tokio::test]
async fn detail_includes_schema_settings_and_actions() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/api/modules/telegram").await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["name"], "telegram");
    assert!(!data["schema"]["fields"].as_array().unwrap().is_empty());
    assert_eq!(data["settings"]["enabled"], false);
    assert_eq!(data["actions"][0]["name"], "sendTest");
}

#[tokio::test]
async fn unknown_module_is_not_found() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/api/modules/nonexistent").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn saved_settings_survive_a_fresh_detail_read() {
    let app = TestApp::new().await;
    let (status, _) = app
        .put_json(
            "/api/modules/branding/settings",
            json!({"title": "Ops Portal", "primaryColor": "#112233"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get("/api/modules/branding").await;
    assert_eq!(body["data"]["settings"]["title"], "Ops Portal");
    assert_eq!(body["data"]["settings"]["primaryColor"], "#112233");
    // Untouched keys keep their defaults.
    assert_eq!(body["data"]["settings"]["footerText"], "");
}

#[tokio::test]
async fn invalid_settings_are_rejected_with_the_field_list() {
    let app = TestApp::new().await;
    let (status, body) = app
        .put_json(
            "/api/modules/branding/settings",
            json!({"title": "", "primaryColor": "blue"}),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "VALIDATION_ERROR");
    let fields: Vec<&str> = body["validationErrors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"title"));
    assert!(fields.contains(&"primaryColor"));

    // The rejected save left nothing behind.
    let (_, detail) = app.get("/api/modules/branding").await;
    assert_eq!(detail["data"]["settings"]["title"], "Meshboard");
}

#[tokio::test]
async fn every_declared_action_is_wired_to_a_handler() {
    let app = TestApp::new().await;
    let (_, list) = app.get("/api/modules").await;

    for module in list["data"].as_array().unwrap() {
        let name = module["name"].as_str().unwrap();
        let (_, detail) = app.get(&format!("/api/modules/{name}")).await;

        for action in detail["data"]["actions"].as_array().unwrap() {
            let action_name = action["name"].as_str().unwrap();
            let (_, body) = app
                .post_json(
                    &format!("/api/modules/{name}/actions/{action_name}"),
                    json!({"name": "missing-endpoint"}),
                )
                .await;
            // The action may legitimately fail (nothing is configured),
            // but it must never fall through to the unknown-action arm.
            if let Some(message) = body.get("message").and_then(Value::as_str) {
                assert!(
                    !message.contains("has no action"),
                    "{name}/{action_name} is declared but not dispatched"
                );
            }
        }
    }
}

#[tokio::test]
async fn unknown_action_is_not_found() {
    let app = TestApp::new().await;
    let (status, body) = app
        .post_json("/api/modules/branding/actions/selfDestruct", json!({}))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].as_str().unwrap().contains("selfDestruct"));
}

#[tokio::test]
async fn reload_keeps_the_generated_secret() {
    let app = TestApp::new().await;
    let before = app.incoming_secret().await;

    let (status, _) = app.post_json("/api/modules/events/reload", json!({})).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(app.incoming_secret().await, before);
}

#[tokio::test]
async fn generate_secret_action_rotates_the_secret() {
    let app = TestApp::new().await;
    let before = app.incoming_secret().await;

    let (status, body) = app
        .post_json("/api/modules/events/actions/generateSecret", json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let rotated = body["data"]["secret"].as_str().unwrap();
    assert_ne!(rotated, before);
    assert_eq!(app.incoming_secret().await, rotated);
}

#[tokio::test]
async fn health_reports_ok() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
}
