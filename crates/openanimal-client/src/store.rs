//! View Model Store.
//!
//! One explicit container for everything the presentation layer draws:
//! the last snapshot of every server resource, plus UI-only state (sort
//! mode, selection, inline messages). The synchronization loop is the only
//! writer; everything else reads.
//!
//! Snapshots are replaced wholesale and only on success, so a failed
//! refresh leaves the previous snapshot on screen. Every request carries a
//! per-resource [`RequestSeq`]; a response is applied only if no later
//! request for the same resource has already landed, so overlapping passes
//! never roll a snapshot back.

use std::cmp::Reverse;

use rand::Rng;

use openanimal_types::{Agent, AgentDetail, AnimalId, Post};

use crate::auth::AuthView;

// ---------------------------------------------------------------------------
// Feed sort
// ---------------------------------------------------------------------------

/// Feed ordering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FeedSort {
    /// Newest first.
    #[default]
    New,
    /// Currently identical to [`FeedSort::New`].
    Top,
    /// A fresh random permutation on every call.
    Shuffle,
}

impl FeedSort {
    /// Parse `new`, `top` or `shuffle`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "new" => Some(Self::New),
            "top" => Some(Self::Top),
            "shuffle" => Some(Self::Shuffle),
            _ => None,
        }
    }

    /// Wire spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Top => "top",
            Self::Shuffle => "shuffle",
        }
    }
}

impl core::fmt::Display for FeedSort {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order a copy of `posts` for display. `posts` itself is never reordered.
///
/// `New` and `Top` sort by effective tick, newest first; ties keep server
/// order. `Shuffle` is a Fisher-Yates pass over the copy.
pub fn sort_feed<R: Rng>(posts: &[Post], mode: FeedSort, rng: &mut R) -> Vec<Post> {
    let mut ordered = posts.to_vec();
    match mode {
        FeedSort::New | FeedSort::Top => {
            ordered.sort_by_key(|post| Reverse(post.effective_tick()));
        }
        FeedSort::Shuffle => {
            for i in (1..ordered.len()).rev() {
                let j = rng.random_range(0..=i);
                ordered.swap(i, j);
            }
        }
    }
    ordered
}

// ---------------------------------------------------------------------------
// Watermark
// ---------------------------------------------------------------------------

/// Highest tick observed so far. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TickWatermark(u64);

impl TickWatermark {
    /// Current value. Zero until anything has been observed.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Raise the watermark to `candidate` if it is higher.
    /// Returns whether it moved.
    pub fn observe(&mut self, candidate: u64) -> bool {
        if candidate > self.0 {
            self.0 = candidate;
            true
        } else {
            false
        }
    }

    /// Observe the maximum of `ticks`; an empty iterator is a no-op.
    pub fn observe_all(&mut self, ticks: impl IntoIterator<Item = u64>) -> bool {
        ticks.into_iter().max().is_some_and(|max| self.observe(max))
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// The selected animal and whatever has loaded for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// The selected animal.
    pub animal_id: AnimalId,
    /// Last loaded detail.
    pub detail: Option<AgentDetail>,
    /// Last loaded timeline lines, as the server sent them.
    pub timeline: Vec<String>,
}

/// Proof of which selection a detail/timeline fetch was issued for.
///
/// Every selection change bumps a generation counter; a result whose
/// ticket no longer matches is stale and must not be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionTicket {
    /// Generation at issue time.
    pub generation: u64,
    /// Animal the fetch is for.
    pub animal_id: AnimalId,
}

// ---------------------------------------------------------------------------
// Refresh indicators
// ---------------------------------------------------------------------------

/// Server resources the loop keeps in sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// All animals.
    Animals,
    /// Animals created by the current identity.
    YourAnimals,
    /// The public feed.
    Feed,
    /// Detail and timeline of the selected animal.
    Selection,
}

impl Resource {
    /// Every resource, in pass order.
    pub const ALL: [Self; 4] = [Self::Animals, Self::YourAnimals, Self::Feed, Self::Selection];

    /// Lowercase name for logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Animals => "animals",
            Self::YourAnimals => "your_animals",
            Self::Feed => "feed",
            Self::Selection => "selection",
        }
    }
}

/// In-flight request counts per resource, plus running full passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefreshState {
    animals: u32,
    your_animals: u32,
    feed: u32,
    selection: u32,
    passes: u32,
}

impl RefreshState {
    const fn slot(&mut self, resource: Resource) -> &mut u32 {
        match resource {
            Resource::Animals => &mut self.animals,
            Resource::YourAnimals => &mut self.your_animals,
            Resource::Feed => &mut self.feed,
            Resource::Selection => &mut self.selection,
        }
    }

    /// Whether `resource` has a request in flight.
    pub const fn is_refreshing(&self, resource: Resource) -> bool {
        let count = match resource {
            Resource::Animals => self.animals,
            Resource::YourAnimals => self.your_animals,
            Resource::Feed => self.feed,
            Resource::Selection => self.selection,
        };
        count > 0
    }

    /// Whether anything is in flight (the "live" indicator).
    pub const fn any(&self) -> bool {
        self.animals > 0 || self.your_animals > 0 || self.feed > 0 || self.selection > 0
    }

    /// Whether a full pass has not settled yet.
    pub const fn pass_in_flight(&self) -> bool {
        self.passes > 0
    }

    pub(crate) const fn begin_pass(&mut self) {
        self.passes = self.passes.saturating_add(1);
    }

    pub(crate) const fn end_pass(&mut self) {
        self.passes = self.passes.saturating_sub(1);
    }

    pub(crate) const fn begin(&mut self, resource: Resource) {
        let slot = self.slot(resource);
        *slot = slot.saturating_add(1);
    }

    pub(crate) const fn end(&mut self, resource: Resource) {
        let slot = self.slot(resource);
        *slot = slot.saturating_sub(1);
    }
}

// ---------------------------------------------------------------------------
// Response ordering
// ---------------------------------------------------------------------------

/// Issue number of one request for a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestSeq(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Sequence {
    issued: u64,
    applied: u64,
}

impl Sequence {
    const fn issue(&mut self) -> RequestSeq {
        self.issued = self.issued.saturating_add(1);
        RequestSeq(self.issued)
    }

    const fn is_superseded(self, seq: RequestSeq) -> bool {
        seq.0 <= self.applied
    }

    const fn accept(&mut self, seq: RequestSeq) -> bool {
        if self.is_superseded(seq) {
            return false;
        }
        self.applied = seq.0;
        true
    }
}

/// Issued and last-applied request numbers per resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct ResponseOrder {
    animals: Sequence,
    your_animals: Sequence,
    feed: Sequence,
    selection: Sequence,
}

impl ResponseOrder {
    const fn slot(&mut self, resource: Resource) -> &mut Sequence {
        match resource {
            Resource::Animals => &mut self.animals,
            Resource::YourAnimals => &mut self.your_animals,
            Resource::Feed => &mut self.feed,
            Resource::Selection => &mut self.selection,
        }
    }

    const fn get(&self, resource: Resource) -> Sequence {
        match resource {
            Resource::Animals => self.animals,
            Resource::YourAnimals => self.your_animals,
            Resource::Feed => self.feed,
            Resource::Selection => self.selection,
        }
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Everything the presentation layer renders.
#[derive(Debug, Clone, Default)]
pub struct ViewModelStore {
    animals: Vec<Agent>,
    your_animals: Vec<Agent>,
    feed: Vec<Post>,
    feed_sort: FeedSort,
    selection: Option<Selection>,
    selection_generation: u64,
    watermark: TickWatermark,
    refreshing: RefreshState,
    order: ResponseOrder,
    birth_pending: bool,
    birth_message: Option<String>,
    return_message: Option<String>,
    auth: AuthView,
}

impl ViewModelStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// All animals, in server order.
    pub fn animals(&self) -> &[Agent] {
        &self.animals
    }

    /// Animals created by the current identity.
    pub fn your_animals(&self) -> &[Agent] {
        &self.your_animals
    }

    /// The feed in server order.
    pub fn feed(&self) -> &[Post] {
        &self.feed
    }

    /// Active sort mode.
    pub const fn feed_sort(&self) -> FeedSort {
        self.feed_sort
    }

    /// The feed ordered for display under the active sort mode.
    pub fn sorted_feed<R: Rng>(&self, rng: &mut R) -> Vec<Post> {
        sort_feed(&self.feed, self.feed_sort, rng)
    }

    /// Current selection, if any.
    pub const fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Id of the selected animal.
    pub fn selected_id(&self) -> Option<&AnimalId> {
        self.selection.as_ref().map(|s| &s.animal_id)
    }

    /// Highest tick observed so far.
    pub const fn watermark(&self) -> u64 {
        self.watermark.get()
    }

    /// Request-in-flight indicators.
    pub const fn refreshing(&self) -> &RefreshState {
        &self.refreshing
    }

    /// Whether a birth request is in flight.
    pub const fn birth_pending(&self) -> bool {
        self.birth_pending
    }

    /// Inline message next to the birth action.
    pub fn birth_message(&self) -> Option<&str> {
        self.birth_message.as_deref()
    }

    /// "Something changed while you were away" nudge.
    pub fn return_message(&self) -> Option<&str> {
        self.return_message.as_deref()
    }

    /// Authentication view state.
    pub const fn auth(&self) -> &AuthView {
        &self.auth
    }

    // -- mutation, reserved for the synchronization loop --

    /// Number the next request for `resource`.
    pub(crate) const fn issue_request(&mut self, resource: Resource) -> RequestSeq {
        self.order.slot(resource).issue()
    }

    /// Whether a response to a later request for `resource` has already
    /// been applied.
    pub(crate) const fn is_superseded(&self, resource: Resource, seq: RequestSeq) -> bool {
        self.order.get(resource).is_superseded(seq)
    }

    /// Returns `false` (and changes nothing) if a later response landed first.
    pub(crate) fn replace_animals(&mut self, seq: RequestSeq, animals: Vec<Agent>) -> bool {
        if !self.order.slot(Resource::Animals).accept(seq) {
            return false;
        }
        self.watermark
            .observe_all(animals.iter().map(|agent| agent.age_ticks));
        self.animals = animals;
        true
    }

    pub(crate) fn replace_your_animals(&mut self, seq: RequestSeq, animals: Vec<Agent>) -> bool {
        if !self.order.slot(Resource::YourAnimals).accept(seq) {
            return false;
        }
        self.your_animals = animals;
        true
    }

    pub(crate) fn clear_your_animals(&mut self) {
        self.your_animals.clear();
    }

    pub(crate) fn replace_feed(&mut self, seq: RequestSeq, posts: Vec<Post>) -> bool {
        if !self.order.slot(Resource::Feed).accept(seq) {
            return false;
        }
        self.watermark
            .observe_all(posts.iter().map(Post::effective_tick));
        self.feed = posts;
        true
    }

    pub(crate) const fn set_feed_sort(&mut self, sort: FeedSort) {
        self.feed_sort = sort;
    }

    /// Select `animal_id`, invalidating any fetch issued for an earlier
    /// selection. Reselecting the same animal keeps its loaded data.
    pub(crate) fn select(&mut self, animal_id: AnimalId) -> SelectionTicket {
        self.selection_generation = self.selection_generation.wrapping_add(1);
        let keep = self
            .selection
            .as_ref()
            .is_some_and(|current| current.animal_id == animal_id);
        if !keep {
            self.selection = Some(Selection {
                animal_id: animal_id.clone(),
                detail: None,
                timeline: Vec::new(),
            });
        }
        SelectionTicket {
            generation: self.selection_generation,
            animal_id,
        }
    }

    /// Ticket for the current selection, without invalidating anything.
    pub(crate) fn selection_ticket(&self) -> Option<SelectionTicket> {
        self.selection.as_ref().map(|s| SelectionTicket {
            generation: self.selection_generation,
            animal_id: s.animal_id.clone(),
        })
    }

    /// Whether `ticket` still describes the current selection.
    pub(crate) fn is_current(&self, ticket: &SelectionTicket) -> bool {
        ticket.generation == self.selection_generation
            && self.selected_id() == Some(&ticket.animal_id)
    }

    /// Apply a detail/timeline result. Returns `false` (and changes
    /// nothing) if the selection has moved on since the ticket was issued
    /// or a later fetch for it has already landed.
    pub(crate) fn apply_selection(
        &mut self,
        ticket: &SelectionTicket,
        seq: RequestSeq,
        detail: AgentDetail,
        timeline: Vec<String>,
    ) -> bool {
        if !self.is_current(ticket) || !self.order.slot(Resource::Selection).accept(seq) {
            return false;
        }
        if let Some(selection) = self.selection.as_mut() {
            selection.detail = Some(detail);
            selection.timeline = timeline;
        }
        true
    }

    /// Clear the selection if `ticket` is still current.
    pub(crate) fn clear_selection_if(&mut self, ticket: &SelectionTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.clear_selection();
        true
    }

    pub(crate) fn clear_selection(&mut self) {
        self.selection_generation = self.selection_generation.wrapping_add(1);
        self.selection = None;
    }

    pub(crate) const fn refreshing_mut(&mut self) -> &mut RefreshState {
        &mut self.refreshing
    }

    pub(crate) const fn set_birth_pending(&mut self, pending: bool) {
        self.birth_pending = pending;
    }

    pub(crate) fn set_birth_message(&mut self, message: Option<String>) {
        self.birth_message = message;
    }

    pub(crate) fn set_return_message(&mut self, message: Option<String>) {
        self.return_message = message;
    }

    pub(crate) const fn auth_mut(&mut self) -> &mut AuthView {
        &mut self.auth
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn agent(id: &str, age: u64) -> Agent {
        serde_json::from_value(serde_json::json!({
            "animal_id": id, "age_ticks": age, "phase": "infant"
        }))
        .unwrap()
    }

    fn post(id: &str, tick: u64, public_tick: Option<u64>) -> Post {
        serde_json::from_value(serde_json::json!({
            "animal_id": id, "tick": tick, "public_tick": public_tick,
            "sentences": ["..."], "phase": "infant"
        }))
        .unwrap()
    }

    fn ids(posts: &[Post]) -> Vec<&str> {
        posts.iter().map(|p| p.animal_id.as_str()).collect()
    }

    #[test]
    fn watermark_from_agents() {
        let mut store = ViewModelStore::new();
        for animals in [
            vec![agent("a", 3), agent("b", 40), agent("c", 400)],
            vec![agent("a", 12)],
            Vec::new(),
        ] {
            let seq = store.issue_request(Resource::Animals);
            assert!(store.replace_animals(seq, animals));
            assert_eq!(store.watermark(), 400);
        }
    }

    #[test]
    fn watermark_from_feed_prefers_public_tick() {
        let mut store = ViewModelStore::new();
        let seq = store.issue_request(Resource::Feed);
        store.replace_feed(seq, vec![post("a", 900, Some(20)), post("b", 10, None)]);
        assert_eq!(store.watermark(), 20);
    }

    #[test]
    fn late_response_from_earlier_request_is_dropped() {
        let mut store = ViewModelStore::new();
        let earlier = store.issue_request(Resource::Animals);
        let later = store.issue_request(Resource::Animals);
        assert!(store.replace_animals(later, vec![agent("a", 200)]));
        assert!(store.is_superseded(Resource::Animals, earlier));
        assert!(!store.replace_animals(earlier, vec![agent("a", 100)]));
        assert_eq!(store.animals().first().unwrap().age_ticks, 200);

        // Sequences are per resource.
        let feed = store.issue_request(Resource::Feed);
        assert!(!store.is_superseded(Resource::Feed, feed));
        assert!(store.replace_feed(feed, Vec::new()));
    }

    #[test]
    fn new_sort_is_stable_and_descending() {
        let posts = vec![
            post("first", 10, None),
            post("second", 5, Some(30)),
            post("third", 10, None),
        ];
        let mut rng = StdRng::seed_from_u64(1);
        let sorted = sort_feed(&posts, FeedSort::New, &mut rng);
        assert_eq!(ids(&sorted), ["second", "first", "third"]);
        assert_eq!(sorted, sort_feed(&posts, FeedSort::Top, &mut rng));
        assert_eq!(ids(&posts), ["first", "second", "third"]);
    }

    #[test]
    fn shuffle_keeps_every_post() {
        let posts: Vec<Post> = (0..20).map(|i| post(&format!("p{i}"), i, None)).collect();
        let mut rng = StdRng::seed_from_u64(42);
        let mut shuffled = ids(&sort_feed(&posts, FeedSort::Shuffle, &mut rng))
            .into_iter()
            .map(str::to_owned)
            .collect::<Vec<_>>();
        shuffled.sort();
        let mut original = ids(&posts).into_iter().map(str::to_owned).collect::<Vec<_>>();
        original.sort();
        assert_eq!(shuffled, original);
    }

    #[test]
    fn stale_ticket_is_rejected() {
        let mut store = ViewModelStore::new();
        let first = store.select(AnimalId::from("a"));
        let second = store.select(AnimalId::from("b"));
        let detail: AgentDetail = serde_json::from_value(serde_json::json!({
            "animal_id": "a", "age_ticks": 1, "phase": "infant"
        }))
        .unwrap();
        let seq = store.issue_request(Resource::Selection);
        assert!(!store.apply_selection(&first, seq, detail, vec!["old".to_owned()]));
        assert!(!store.clear_selection_if(&first));
        assert_eq!(store.selected_id().unwrap().as_str(), "b");
        assert!(store.clear_selection_if(&second));
        assert!(store.selection().is_none());
    }

    #[test]
    fn reselect_keeps_loaded_data() {
        let mut store = ViewModelStore::new();
        let ticket = store.select(AnimalId::from("a"));
        let detail: AgentDetail = serde_json::from_value(serde_json::json!({
            "animal_id": "a", "age_ticks": 1, "phase": "infant"
        }))
        .unwrap();
        let seq = store.issue_request(Resource::Selection);
        assert!(store.apply_selection(&ticket, seq, detail, vec!["line".to_owned()]));
        let _ = store.select(AnimalId::from("a"));
        assert_eq!(store.selection().unwrap().timeline, ["line"]);
    }

    #[test]
    fn refresh_counts_nest() {
        let mut state = RefreshState::default();
        state.begin(Resource::Feed);
        state.begin(Resource::Feed);
        state.end(Resource::Feed);
        assert!(state.is_refreshing(Resource::Feed));
        state.end(Resource::Feed);
        state.end(Resource::Feed);
        assert!(!state.any());
    }

    #[test]
    fn sort_parsing() {
        assert_eq!(FeedSort::parse("Shuffle"), Some(FeedSort::Shuffle));
        assert_eq!(FeedSort::parse("hot"), None);
        assert_eq!(FeedSort::default().to_string(), "new");
    }
}
