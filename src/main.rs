//! Meshboard Server — modular event and notification hub
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use meshboard_core::config::AppConfig;
use meshboard_core::error::AppError;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("MESHBOARD_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Meshboard v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Create data directory ────────────────────────────
    tokio::fs::create_dir_all(&config.storage.data_dir)
        .await
        .map_err(|e| {
            AppError::configuration(format!(
                "Failed to create data dir '{}': {e}",
                config.storage.data_dir
            ))
        })?;

    // ── Step 2: Initialize settings store ────────────────────────
    tracing::info!(
        "Loading settings document from {}",
        config.storage.settings_path().display()
    );
    let store = Arc::new(meshboard_store::SettingsStore::new(
        config.storage.settings_path(),
    ));
    store.init().await?;

    // ── Step 3: Load feature modules ─────────────────────────────
    tracing::info!("Loading modules...");
    let gateway = Arc::new(meshboard_ingest::gateway::EventsModule::new(Arc::clone(
        &store,
    )));

    let mut modules = meshboard_modules::available_modules(&store);
    modules.push(Arc::clone(&gateway) as Arc<dyn meshboard_module::Module>);

    let registry = Arc::new(meshboard_module::ModuleRegistry::new(Arc::clone(&store)));
    let failures = registry.load_all(modules).await;
    for failure in &failures {
        tracing::warn!(
            module = %failure.module,
            error = %failure.error,
            "Module unavailable"
        );
    }
    tracing::info!(
        loaded = registry.module_list().await.len(),
        failed = failures.len(),
        "Modules loaded"
    );

    // ── Step 4: Build and start HTTP server ──────────────────────
    let app_state = meshboard_api::state::AppState {
        config: Arc::new(config.clone()),
        store: Arc::clone(&store),
        registry: Arc::clone(&registry),
        gateway: Arc::clone(&gateway),
    };

    let app = meshboard_api::router::build_router(app_state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("Meshboard server listening on {addr}");

    // ── Step 5: Graceful shutdown ────────────────────────────────
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    tracing::info!("Meshboard server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
