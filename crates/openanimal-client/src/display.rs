//! Display conventions.
//!
//! Pure functions turning ticks, phases and timeline lines into the text a
//! renderer shows. Nothing here touches the store; a renderer passes in
//! the watermark it read.

use std::borrow::Cow;

use openanimal_types::Phase;

/// Server ticks per wall-clock minute (one tick every ten seconds).
pub const TICKS_PER_MINUTE: u64 = 6;

/// Ticks within which something counts as "just now".
pub const FRESH_TICKS: u64 = 2;

/// Prefix marking a collapsed run of silent ticks in a timeline.
pub const SILENCE_MARKER: &str = "...";

/// Avatar variants, in hash order.
pub const AVATAR_VARIANTS: [&str; 6] = ["bird", "fox", "turtle", "owl", "snail", "lizard"];

/// Shown when nothing is selected.
pub const NO_SELECTION: &str = "No animal selected.";

/// Shown for a selected animal with no timeline lines.
pub const EMPTY_TIMELINE: &str = "Silence.";

/// Shown when a detail carries no `last_activity`.
pub const QUIET_ACTIVITY: &str = "Quiet.";

/// Empty feed while the world is still too small to converse.
pub const EMPTY_FEED_FEW_ANIMALS: &str = "Birth 2 or more agents to see them react to each other. \
                                          The simulation runs quietly in the background.";

/// Empty feed otherwise.
pub const EMPTY_FEED: &str = "No posts yet. The world is quiet right now.";

const SILENCE_PHRASE: &str = " ticks of silence";
const QUIET_PHRASE: &str = "quiet for a while";

fn minutes(ticks: u64) -> u64 {
    ticks.checked_div(TICKS_PER_MINUTE).unwrap_or(0)
}

fn hours(minutes: u64) -> u64 {
    minutes.checked_div(60).unwrap_or(0)
}

/// Human age for `age_ticks`.
pub fn format_age(age_ticks: u64) -> String {
    if age_ticks <= FRESH_TICKS {
        return "newborn".to_owned();
    }
    if age_ticks <= 12 {
        return "a few min old".to_owned();
    }
    let min = minutes(age_ticks);
    if min < 60 {
        return format!("{min} min old");
    }
    match hours(min) {
        1 => "about 1 hr old".to_owned(),
        hr => format!("about {hr} hr old"),
    }
}

/// How long ago `tick` was, measured against `watermark`.
///
/// A zero watermark means nothing has been observed yet, in which case
/// `tick` is taken as "now".
pub fn format_time_ago(tick: u64, watermark: u64) -> String {
    let now = if watermark == 0 { tick } else { watermark };
    let diff = now.saturating_sub(tick);
    if diff <= FRESH_TICKS {
        return "just now".to_owned();
    }
    match minutes(diff) {
        0 => "a moment ago".to_owned(),
        1 => "1 min ago".to_owned(),
        min if min < 60 => format!("{min} min ago"),
        min => match hours(min) {
            1 => "1 hr ago".to_owned(),
            hr => format!("{hr} hr ago"),
        },
    }
}

/// Whether `tick` is recent enough to highlight.
pub const fn is_fresh(tick: u64, watermark: u64) -> bool {
    watermark.saturating_sub(tick) <= FRESH_TICKS
}

/// Display name of a phase; an unknown value is echoed as-is.
pub fn phase_label(raw: &str) -> Cow<'_, str> {
    Phase::from_wire(raw).map_or(Cow::Borrowed(raw), |phase| Cow::Borrowed(phase.label()))
}

/// Rewrite tick counts in a silence line to a qualitative phrase.
///
/// Only lines starting with [`SILENCE_MARKER`] are touched; there every
/// `<digits> ticks of silence` becomes `quiet for a while`.
pub fn soften_silence(line: &str) -> Cow<'_, str> {
    if !line.starts_with(SILENCE_MARKER) {
        return Cow::Borrowed(line);
    }
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    let mut changed = false;
    while let Some(pos) = rest.find(SILENCE_PHRASE) {
        let (before, after) = rest.split_at(pos);
        let after = after.strip_prefix(SILENCE_PHRASE).unwrap_or(after);
        let kept = before.trim_end_matches(|c: char| c.is_ascii_digit());
        if kept.len() == before.len() {
            out.push_str(before);
            out.push_str(SILENCE_PHRASE);
        } else {
            out.push_str(kept);
            out.push_str(QUIET_PHRASE);
            changed = true;
        }
        rest = after;
    }
    if !changed {
        return Cow::Borrowed(line);
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// First dash-separated segment of an id.
pub fn short_id(id: &str) -> &str {
    id.split('-').next().unwrap_or(id)
}

/// Capitalise the first character.
pub fn title_case(value: &str) -> String {
    let mut chars = value.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Species heading, `Animal` when unknown.
pub fn species_label(species: Option<&str>) -> String {
    title_case(species.filter(|s| !s.is_empty()).unwrap_or("Animal"))
}

/// 32-bit rolling hash of an id over UTF-16 code units (`h * 31 + c`).
fn hash_id(id: &str) -> u32 {
    id.encode_utf16()
        .fold(0_i32, |h, unit| {
            h.wrapping_shl(5).wrapping_sub(h).wrapping_add(i32::from(unit))
        })
        .unsigned_abs()
}

/// Deterministic avatar for an animal. A species that names a variant
/// wins; otherwise the id hash picks one.
pub fn avatar_variant(animal_id: &str, species: Option<&str>) -> &'static str {
    if let Some(known) = species.and_then(|s| AVATAR_VARIANTS.iter().copied().find(|v| *v == s)) {
        return known;
    }
    let count = u32::try_from(AVATAR_VARIANTS.len()).unwrap_or(1);
    let index = hash_id(animal_id).checked_rem(count).unwrap_or(0);
    usize::try_from(index)
        .ok()
        .and_then(|i| AVATAR_VARIANTS.get(i))
        .copied()
        .unwrap_or("bird")
}
