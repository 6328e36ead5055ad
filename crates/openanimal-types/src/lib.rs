//! Shared wire types for the OpenAnimal client.
//!
//! This crate is the single source of truth for the JSON shapes the
//! simulation backend serves and the client consumes. Types defined here
//! flow downstream to `TypeScript` via `ts-rs` for the browser
//! presentation layer.
//!
//! # Modules
//!
//! - [`ids`] -- Opaque string identifiers (animals, creators, users)
//! - [`enums`] -- The ordered lifecycle [`Phase`]
//! - [`structs`] -- Agents, posts, and timelines as the server projects them
//! - [`payloads`] -- Request/response bodies for birth, auth, config, errors

pub mod enums;
pub mod ids;
pub mod payloads;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{PHASE_THRESHOLDS, Phase};
pub use ids::{AnimalId, CreatorKey, UserId};
pub use payloads::{
    AuthGrant, BirthReceipt, BirthRequest, ErrorEnvelope, GoogleCredential, PublicConfig, WhoAmI,
};
pub use structs::{Agent, AgentDetail, AnimalList, Feed, Post, TimelineResponse};
