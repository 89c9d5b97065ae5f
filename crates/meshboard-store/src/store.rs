//! The durable settings store.
//!
//! A single JSON document is the system of record. All mutation paths
//! (set, register, import, update closures) run under one write lock and
//! finish with an atomic write-to-temp + rename, so a reader never
//! observes a partially-written document and interleaved
//! read-modify-write sequences cannot lose updates.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::{Map, Value, json};
use tokio::sync::RwLock;
use tracing::{debug, info};

use meshboard_core::error::AppError;
use meshboard_core::result::AppResult;

/// Reserved meta key tracking the document schema version.
pub const VERSION_KEY: &str = "_version";
/// Reserved meta key tracking the last successful write time (RFC 3339).
pub const LAST_MODIFIED_KEY: &str = "_lastModified";
/// Legacy nested namespace container checked by the second `get` tier.
pub const LEGACY_MODULES_KEY: &str = "modules";

const SCHEMA_VERSION: u64 = 1;

struct StoreState {
    /// `None` until `init()` completes.
    doc: Option<Map<String, Value>>,
    /// Defaults recorded by `register_module`, keyed by namespace.
    /// Used to re-fill structure on `import`.
    defaults: Map<String, Value>,
}

/// Durable key/namespace-scoped settings with deep-merge defaulting and
/// atomic, crash-safe persistence.
pub struct SettingsStore {
    path: PathBuf,
    state: RwLock<StoreState>,
}

impl SettingsStore {
    /// Creates a store bound to a settings file path. No I/O happens
    /// until [`SettingsStore::init`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: RwLock::new(StoreState {
                doc: None,
                defaults: Map::new(),
            }),
        }
    }

    /// Path of the backing settings file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the existing document, or seeds a fresh one with built-in
    /// defaults when the file does not exist yet.
    ///
    /// Fails only when the storage is unreadable for reasons other than
    /// "does not exist" (I/O errors, malformed JSON, non-object root).
    pub async fn init(&self) -> AppResult<()> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                AppError::configuration(format!(
                    "Cannot create settings directory '{}': {e}",
                    dir.display()
                ))
            })?;
        }

        let mut state = self.state.write().await;

        let doc = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => {
                let value: Value = serde_json::from_str(&contents).map_err(|e| {
                    AppError::configuration(format!(
                        "Settings file '{}' is not valid JSON: {e}",
                        self.path.display()
                    ))
                })?;
                match value {
                    Value::Object(map) => map,
                    _ => {
                        return Err(AppError::configuration(format!(
                            "Settings file '{}' must contain a JSON object",
                            self.path.display()
                        )));
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No settings file found, seeding defaults");
                let mut doc = Map::new();
                doc.insert(VERSION_KEY.to_string(), json!(SCHEMA_VERSION));
                stamp(&mut doc);
                save_atomic(&self.path, &doc).await?;
                doc
            }
            Err(e) => {
                return Err(AppError::with_source(
                    meshboard_core::error::ErrorKind::Configuration,
                    format!("Cannot read settings file '{}'", self.path.display()),
                    e,
                ));
            }
        };

        info!(path = %self.path.display(), keys = doc.len(), "Settings store initialized");
        state.doc = Some(doc);
        Ok(())
    }

    /// Resolves a key or dot-path, falling back to `default`.
    ///
    /// Resolution is three-tier: a direct top-level key first, then the
    /// legacy `modules.<key>` subtree, then full dot-path traversal.
    /// Both addressing styles stay interchangeable so documents written
    /// under the older nested layout keep working without a migration.
    pub async fn get(&self, key_or_path: &str, default: Value) -> AppResult<Value> {
        let state = self.state.read().await;
        let doc = require_doc(&state)?;

        if let Some(value) = doc.get(key_or_path) {
            return Ok(value.clone());
        }

        if let Some(legacy) = doc.get(LEGACY_MODULES_KEY).and_then(Value::as_object)
            && let Some(value) = legacy.get(key_or_path)
        {
            return Ok(value.clone());
        }

        if key_or_path.contains('.') {
            let root = Value::Object(doc.clone());
            if let Some(value) = crate::path::get_path(&root, key_or_path) {
                return Ok(value.clone());
            }
        }

        Ok(default)
    }

    /// Writes a key or dot-path and persists atomically.
    ///
    /// Dot-path writes create intermediate objects as needed; direct-key
    /// writes replace the top-level value wholesale.
    pub async fn set(&self, key_or_path: &str, value: Value) -> AppResult<()> {
        let mut state = self.state.write().await;
        let doc = require_doc_mut(&mut state)?;

        if key_or_path.contains('.') {
            crate::path::set_path(doc, key_or_path, value);
        } else {
            doc.insert(key_or_path.to_string(), value);
        }

        stamp(doc);
        save_atomic(&self.path, doc).await?;
        debug!(key = key_or_path, "Setting written");
        Ok(())
    }

    /// Read-modify-write on one namespace under the write lock.
    ///
    /// The closure receives the current namespace value (an empty object
    /// when absent); the result is written back and persisted before the
    /// lock is released, closing the lost-update window that separate
    /// get/set calls would leave open.
    pub async fn update<F>(&self, namespace: &str, mutate: F) -> AppResult<Value>
    where
        F: FnOnce(&mut Value) + Send,
    {
        let mut state = self.state.write().await;
        let doc = require_doc_mut(&mut state)?;

        let mut value = doc
            .get(namespace)
            .or_else(|| {
                doc.get(LEGACY_MODULES_KEY)
                    .and_then(Value::as_object)
                    .and_then(|legacy| legacy.get(namespace))
            })
            .cloned()
            .unwrap_or_else(|| json!({}));

        mutate(&mut value);
        doc.insert(namespace.to_string(), value.clone());
        stamp(doc);
        save_atomic(&self.path, doc).await?;
        Ok(value)
    }

    /// Registers a module namespace, merging any existing user settings
    /// over the supplied defaults (existing leaf values win, missing
    /// keys are filled). This is the single mechanism by which new
    /// default fields reach old documents across upgrades.
    pub async fn register_module(&self, name: &str, defaults: Value) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.defaults.insert(name.to_string(), defaults.clone());
        let doc = require_doc_mut(&mut state)?;

        let existing = doc.get(name).cloned().or_else(|| {
            doc.get(LEGACY_MODULES_KEY)
                .and_then(Value::as_object)
                .and_then(|legacy| legacy.get(name))
                .cloned()
        });

        let merged = match existing {
            Some(current) => crate::merge::deep_merge(&defaults, &current),
            None => defaults,
        };

        doc.insert(name.to_string(), merged);
        stamp(doc);
        save_atomic(&self.path, doc).await?;
        debug!(module = name, "Module defaults registered");
        Ok(())
    }

    /// Removes one module namespace (both addressing styles).
    pub async fn delete_namespace(&self, name: &str) -> AppResult<()> {
        let mut state = self.state.write().await;
        let doc = require_doc_mut(&mut state)?;

        doc.remove(name);
        if let Some(legacy) = doc.get_mut(LEGACY_MODULES_KEY).and_then(Value::as_object_mut) {
            legacy.remove(name);
        }

        stamp(doc);
        save_atomic(&self.path, doc).await?;
        info!(module = name, "Namespace deleted");
        Ok(())
    }

    /// Serializes the entire document.
    pub async fn export(&self) -> AppResult<Value> {
        let state = self.state.read().await;
        let doc = require_doc(&state)?;
        Ok(Value::Object(doc.clone()))
    }

    /// Replaces the document with `deep_merge(defaults, imported)`.
    ///
    /// Merging against the accumulated registered defaults guards
    /// against a partial or foreign document wiping out required
    /// structure: namespaces missing from the import come back with
    /// their full default shape.
    pub async fn import(&self, imported: Value) -> AppResult<()> {
        if !imported.is_object() {
            return Err(AppError::validation(
                "Imported settings must be a JSON object",
            ));
        }

        let mut state = self.state.write().await;
        require_doc(&state)?;

        let mut default_doc = Map::new();
        default_doc.insert(VERSION_KEY.to_string(), json!(SCHEMA_VERSION));
        for (name, defaults) in &state.defaults {
            default_doc.insert(name.clone(), defaults.clone());
        }

        let merged = crate::merge::deep_merge(&Value::Object(default_doc), &imported);
        let mut doc = match merged {
            Value::Object(map) => map,
            _ => unreachable!("merge of two objects is an object"),
        };
        doc.insert(VERSION_KEY.to_string(), json!(SCHEMA_VERSION));
        stamp(&mut doc);

        save_atomic(&self.path, &doc).await?;
        state.doc = Some(doc);
        info!("Settings document imported");
        Ok(())
    }
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

fn require_doc<'a>(state: &'a StoreState) -> AppResult<&'a Map<String, Value>> {
    state
        .doc
        .as_ref()
        .ok_or_else(|| AppError::not_initialized("Settings store accessed before init()"))
}

fn require_doc_mut<'a>(state: &'a mut StoreState) -> AppResult<&'a mut Map<String, Value>> {
    state
        .doc
        .as_mut()
        .ok_or_else(|| AppError::not_initialized("Settings store accessed before init()"))
}

fn stamp(doc: &mut Map<String, Value>) {
    doc.insert(LAST_MODIFIED_KEY.to_string(), json!(Utc::now().to_rfc3339()));
    doc.entry(VERSION_KEY.to_string())
        .or_insert(json!(SCHEMA_VERSION));
}

/// Serializes to `<file>.tmp` in the same directory, then renames over
/// the real file. A crash between write and rename leaves the previous
/// document intact.
async fn save_atomic(path: &Path, doc: &Map<String, Value>) -> AppResult<()> {
    let serialized = serde_json::to_string_pretty(&Value::Object(doc.clone()))
        .map_err(|e| AppError::serialization(format!("Cannot serialize settings: {e}")))?;

    let tmp = tmp_path(path);
    tokio::fs::write(&tmp, serialized.as_bytes())
        .await
        .map_err(|e| {
            AppError::configuration(format!("Cannot write '{}': {e}", tmp.display()))
        })?;
    tokio::fs::rename(&tmp, path).await.map_err(|e| {
        AppError::configuration(format!(
            "Cannot rename '{}' over '{}': {e}",
            tmp.display(),
            path.display()
        ))
    })?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}
