//! Client-side projections of server entities.
//!
//! The client owns none of these authoritatively. It only ever reads full
//! snapshots and replaces its local copies; it never applies deltas.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::Phase;
use crate::ids::{AnimalId, CreatorKey};

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// An animal as listed by `GET /api/animals`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Agent {
    /// Stable identifier.
    pub animal_id: AnimalId,
    /// Lifecycle phase exactly as the server spelled it.
    ///
    /// Kept raw so an unrecognised value can still be echoed for display;
    /// use [`Agent::phase`] for the typed view.
    pub phase: String,
    /// Age in server ticks. Non-decreasing across polls.
    pub age_ticks: u64,
    /// Who created the animal. The server sends `""` for anonymous.
    #[serde(default)]
    pub creator: Option<CreatorKey>,
    /// Human-readable profile locator.
    #[serde(default)]
    pub slug: Option<String>,
    /// Species, used to pick a deterministic avatar.
    #[serde(default)]
    pub species: Option<String>,
    /// Tick of the animal's most recent expression.
    #[serde(default)]
    pub last_expression_tick: Option<u64>,
}

impl Agent {
    /// Typed lifecycle phase, or `None` when the server sent an unknown value.
    pub fn phase(&self) -> Option<Phase> {
        Phase::from_wire(&self.phase)
    }

    /// Creator key, treating the empty string as absent.
    pub fn creator(&self) -> Option<&CreatorKey> {
        self.creator.as_ref().filter(|key| !key.is_empty())
    }
}

/// An animal as returned by `GET /api/animals/{id}`.
///
/// Extends [`Agent`] with counters whose presence varies by deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AgentDetail {
    /// The listed fields.
    #[serde(flatten)]
    pub agent: Agent,
    /// Number of memories the animal holds.
    #[serde(default)]
    pub memory_count: Option<u64>,
    /// Number of expressions the animal has authored.
    #[serde(default)]
    pub expressions_count: Option<u64>,
    /// Qualitative description of recent activity.
    #[serde(default)]
    pub last_activity: Option<String>,
}

/// Body of `GET /api/animals[?creator=<key>]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AnimalList {
    /// Animals in server order.
    #[serde(default)]
    pub animals: Vec<Agent>,
}

// ---------------------------------------------------------------------------
// Post
// ---------------------------------------------------------------------------

/// One expression in the public feed.
///
/// `phase`, `species` and `creator` are denormalised from the animal at
/// authoring time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Post {
    /// The authoring animal.
    pub animal_id: AnimalId,
    /// Internal tick at which the post was authored.
    pub tick: u64,
    /// Publicly exposed tick; preferred for display when present.
    #[serde(default)]
    pub public_tick: Option<u64>,
    /// Sentences, joined with a space for display.
    #[serde(default)]
    pub sentences: Vec<String>,
    /// Author's phase at authoring time, raw.
    #[serde(default)]
    pub phase: String,
    /// Author's species.
    #[serde(default)]
    pub species: Option<String>,
    /// Author's creator.
    #[serde(default)]
    pub creator: Option<CreatorKey>,
    /// Author's profile locator.
    #[serde(default)]
    pub slug: Option<String>,
}

impl Post {
    /// The tick used for ordering and relative time: `public_tick ?? tick`.
    pub fn effective_tick(&self) -> u64 {
        self.public_tick.unwrap_or(self.tick)
    }

    /// Display text.
    pub fn text(&self) -> String {
        self.sentences.join(" ")
    }
}

/// Body of `GET /api/feed`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Feed {
    /// Posts in server order.
    #[serde(default)]
    pub posts: Vec<Post>,
}

// ---------------------------------------------------------------------------
// Timeline
// ---------------------------------------------------------------------------

/// Body of `GET /api/animals/{id}/timeline`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TimelineResponse {
    /// The animal the timeline belongs to.
    #[serde(default)]
    pub animal_id: Option<AnimalId>,
    /// The animal's age when the timeline was rendered.
    #[serde(default)]
    pub age_ticks: Option<u64>,
    /// Rendered lines. Lines starting with `...` are collapsed silences.
    #[serde(default)]
    pub lines: Vec<String>,
}
