//! Client-side state synchronization for `OpenAnimal`.
//!
//! Polls the simulation API for animals, the feed and the selected
//! animal, reconciles the visitor's identity across anonymous and signed-in
//! modes, and keeps one [`ViewModelStore`] eventually consistent with the
//! server for a renderer to draw.
//!
//! # Architecture
//!
//! ```text
//! timer / user command --> SyncEngine --> AnimalApi --> server
//!                              |
//!                              v
//!                       ViewModelStore --> RenderSink
//! ```
//!
//! # Modules
//!
//! - [`identity`] -- Identity Resolver over an identity policy
//! - [`api`] -- the [`AnimalApi`] seam and its `reqwest` client
//! - [`store`] -- View Model Store, tick watermark, feed ordering
//! - [`sync`] -- Synchronization Loop, birth and sign-in flows
//! - [`scheduler`] -- single-timer poll scheduler
//! - [`auth`] -- sign-in state machine
//! - [`storage`] -- best-effort durable key/value store and cookie mirror
//! - [`display`] -- age, relative time, phase label and timeline text
//! - [`presence`] -- "something changed while you were away" nudge
//! - [`render`] -- the presentation seam
//! - [`config`] -- YAML + environment configuration
//! - [`error`] -- error taxonomy

pub mod api;
pub mod auth;
pub mod config;
pub mod display;
pub mod error;
pub mod identity;
pub mod presence;
pub mod render;
pub mod scheduler;
pub mod storage;
pub mod store;
pub mod sync;

pub use api::{AnimalApi, ApiClient};
pub use auth::{AuthPhase, AuthView, ProviderState};
pub use config::ClientConfig;
pub use error::{ApiError, BirthError, ConfigError, ErrorKind, SignInError, StorageError};
pub use identity::{Identity, IdentityPolicy, IdentityResolver, Session};
pub use render::{NoOpRenderer, RecordingRenderer, Region, RenderSink};
pub use scheduler::PollScheduler;
pub use storage::{BestEffortStore, CookieMirror, DisabledStore, FileStore, KeyValueStore, MemoryStore};
pub use store::{FeedSort, Resource, Selection, TickWatermark, ViewModelStore, sort_feed};
pub use sync::{Command, PassReport, StepOutcome, SyncEngine};
