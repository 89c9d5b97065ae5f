//! # meshboard-api
//!
//! HTTP API layer for Meshboard built on Axum.
//!
//! Exposes module management, the inbound webhook receiver, settings
//! export/import, health, and error mapping. Handlers stay thin: all
//! semantics live in the store, registry, and gateway crates.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
