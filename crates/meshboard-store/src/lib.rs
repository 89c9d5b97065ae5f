//! # meshboard-store
//!
//! Durable, namespace-scoped settings for Meshboard.
//!
//! The settings document is a single JSON tree persisted at a configured
//! path. Each top-level key is either a global setting or a module
//! namespace. Reads tolerate both the flat top-level layout and the
//! older nested `modules.*` layout; writes are atomic
//! (write-to-temp + rename) and serialized through one write lock.

pub mod merge;
pub mod path;
pub mod store;

pub use merge::deep_merge;
pub use store::SettingsStore;
