//! Settings document export and import.

use http::StatusCode;
use serde_json::json;

use crate::helpers::TestApp;

#[tokio::test]
async fn export_returns_the_full_document() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/api/settings/export").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.get("_version").is_some());
    assert!(body.get("_lastModified").is_some());
    for namespace in ["telegram", "email", "webhooks", "branding", "events"] {
        assert!(body.get(namespace).is_some(), "missing namespace {namespace}");
    }
}

#[tokio::test]
async fn import_keeps_values_and_refills_missing_namespaces() {
    let app = TestApp::new().await;

    // A partial document, as an older backup would be.
    let (status, _) = app
        .post_json(
            "/api/settings/import",
            json!({"branding": {"title": "Restored Portal"}}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, exported) = app.get("/api/settings/export").await;
    assert_eq!(exported["branding"]["title"], "Restored Portal");
    // Namespaces absent from the import are refilled from registered
    // defaults rather than lost.
    assert_eq!(exported["telegram"]["quietHoursStart"], "22:00");
    assert_eq!(exported["events"]["authRequired"], false);
}

#[tokio::test]
async fn import_rejects_non_object_documents() {
    let app = TestApp::new().await;
    let (status, body) = app.post_json("/api/settings/import", json!([1, 2, 3])).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn import_round_trips_an_export() {
    let app = TestApp::new().await;
    app.store
        .update("branding", |ns| {
            ns["title"] = json!("Before Backup");
        })
        .await
        .unwrap();

    let (_, exported) = app.get("/api/settings/export").await;

    app.store
        .update("branding", |ns| {
            ns["title"] = json!("After Backup");
        })
        .await
        .unwrap();

    let (status, _) = app.post_json("/api/settings/import", exported).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get("/api/modules/branding").await;
    assert_eq!(body["data"]["settings"]["title"], "Before Backup");
}
