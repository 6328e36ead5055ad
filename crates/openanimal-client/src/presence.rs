//! "Something changed while you were away" nudge.
//!
//! The last-seen timestamp lives in durable storage and exists only to
//! decide whether to show this nudge.

use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::storage::{BestEffortStore, KeyValueStore, LAST_SEEN_KEY};

/// How long a visitor must be away before the nudge shows.
pub const AWAY_THRESHOLD: TimeDelta = TimeDelta::minutes(20);

/// Messages the nudge picks from.
pub const RETURN_MESSAGES: [&str; 5] = [
    "Your animal changed.",
    "It noticed another presence.",
    "It was quiet for a long time.",
    "Another observer joined.",
    "New presence detected.",
];

/// Decide whether to greet a returning visitor, then record `now` as last
/// seen.
///
/// First visits (no timestamp) and unreadable timestamps never nudge.
pub fn check_return<S: KeyValueStore, R: Rng>(
    store: &mut BestEffortStore<S>,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Option<&'static str> {
    let last_seen = store
        .get(LAST_SEEN_KEY)
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .filter(|millis| *millis > 0)
        .and_then(DateTime::<Utc>::from_timestamp_millis);

    store.set(LAST_SEEN_KEY, &now.timestamp_millis().to_string());

    let away = now.signed_duration_since(last_seen?);
    if away < AWAY_THRESHOLD {
        return None;
    }
    RETURN_MESSAGES.choose(rng).copied()
}
