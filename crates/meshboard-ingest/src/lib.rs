//! # meshboard-ingest
//!
//! Inbound event ingestion: webhook authentication (HMAC-SHA256),
//! platform-to-canonical event-name mapping, payload canonicalization,
//! and the bounded event log. The [`gateway::EventsModule`] ties these
//! together as the `events` feature module consumed by the HTTP layer.
//!
//! Pipeline: Received → Authenticated → Canonicalized → Dispatched.

pub mod gateway;
pub mod log;
pub mod mapping;
pub mod normalize;
pub mod signature;

pub use gateway::EventsModule;
