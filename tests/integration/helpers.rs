//! Shared test helpers for integration tests.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use meshboard_core::config::AppConfig;
use meshboard_ingest::gateway::EventsModule;
use meshboard_module::{Module, ModuleRegistry};
use meshboard_store::SettingsStore;

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Settings store for direct inspection
    pub store: Arc<SettingsStore>,
    /// Loaded module registry
    pub registry: Arc<ModuleRegistry>,
    /// Inbound event gateway
    pub gateway: Arc<EventsModule>,
    _dir: tempfile::TempDir,
}

impl TestApp {
    /// Create a new test application with all modules loaded against a
    /// fresh temporary settings document.
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = Arc::new(SettingsStore::new(dir.path().join("settings.json")));
        store.init().await.expect("Failed to init settings store");

        let gateway = Arc::new(EventsModule::new(Arc::clone(&store)));
        let mut modules = meshboard_modules::available_modules(&store);
        modules.push(Arc::clone(&gateway) as Arc<dyn Module>);

        let registry = Arc::new(ModuleRegistry::new(Arc::clone(&store)));
        let failures = registry.load_all(modules).await;
        assert!(failures.is_empty(), "Modules failed to load: {failures:?}");

        let state = meshboard_api::state::AppState {
            config: Arc::new(AppConfig::default()),
            store: Arc::clone(&store),
            registry: Arc::clone(&registry),
            gateway: Arc::clone(&gateway),
        };

        Self {
            router: meshboard_api::router::build_router(state),
            store,
            registry,
            gateway,
            _dir: dir,
        }
    }

    /// GET a path, returning status and parsed JSON body.
    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    /// PUT a JSON body.
    pub async fn put_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method("PUT")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// POST a JSON body.
    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// POST raw bytes with optional signature header.
    pub async fn post_raw(
        &self,
        uri: &str,
        body: Vec<u8>,
        signature: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(sig) = signature {
            builder = builder.header("x-webhook-signature", sig);
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("Response was not JSON")
        };
        (status, body)
    }

    /// The gateway's generated incoming secret.
    pub async fn incoming_secret(&self) -> String {
        self.store
            .get("events", serde_json::json!({}))
            .await
            .unwrap()
            .get("incomingSecret")
            .and_then(Value::as_str)
            .unwrap()
            .to_string()
    }
}
