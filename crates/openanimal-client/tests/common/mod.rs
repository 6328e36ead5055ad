//! Scripted in-memory [`AnimalApi`] for engine tests.
//!
//! Every endpoint answers from a script the test sets up front, and every
//! call is recorded so tests can assert what the engine asked for.

#![allow(dead_code, clippy::unwrap_used)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use openanimal_client::error::GENERIC_ERROR_CODE;
use openanimal_client::storage::{AUTH_TOKEN_KEY, BestEffortStore, KeyValueStore, MemoryStore};
use openanimal_client::{
    AnimalApi, ApiError, IdentityPolicy, IdentityResolver, RecordingRenderer, SyncEngine,
};
use openanimal_types::{
    Agent, AgentDetail, AnimalId, AnimalList, AuthGrant, BirthReceipt, BirthRequest, CreatorKey,
    Feed, GoogleCredential, Post, PublicConfig, TimelineResponse, WhoAmI,
};
use tokio::sync::Notify;

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    /// Endpoint name.
    pub endpoint: &'static str,
    /// Path argument (animal id or creator key), if any.
    pub arg: Option<String>,
    /// Bearer credential sent, if any.
    pub credential: Option<String>,
}

/// Scripted API.
#[derive(Default)]
pub struct FakeApi {
    pub animals: RefCell<Option<Result<AnimalList, ApiError>>>,
    pub your_animals: RefCell<Option<Result<AnimalList, ApiError>>>,
    pub feed: RefCell<Option<Result<Feed, ApiError>>>,
    pub details: RefCell<HashMap<String, Result<AgentDetail, ApiError>>>,
    pub timelines: RefCell<HashMap<String, Result<TimelineResponse, ApiError>>>,
    pub birth: RefCell<Option<Result<BirthReceipt, ApiError>>>,
    pub config: RefCell<Option<Result<PublicConfig, ApiError>>>,
    pub me: RefCell<Option<Result<WhoAmI, ApiError>>>,
    pub grant: RefCell<Option<Result<AuthGrant, ApiError>>>,
    pub gates: RefCell<HashMap<String, Rc<Notify>>>,
    pub held: RefCell<HashMap<&'static str, Rc<Notify>>>,
    pub calls: RefCell<Vec<Call>>,
}

impl FakeApi {
    pub fn new() -> Self {
        let api = Self::default();
        *api.animals.borrow_mut() = Some(Ok(AnimalList::default()));
        *api.your_animals.borrow_mut() = Some(Ok(AnimalList::default()));
        *api.feed.borrow_mut() = Some(Ok(Feed::default()));
        *api.config.borrow_mut() = Some(Ok(PublicConfig {
            google_client_id: Some("client-123.apps".to_owned()),
        }));
        api
    }

    pub fn set_animals(&self, result: Result<AnimalList, ApiError>) {
        *self.animals.borrow_mut() = Some(result);
    }

    pub fn set_your_animals(&self, result: Result<AnimalList, ApiError>) {
        *self.your_animals.borrow_mut() = Some(result);
    }

    pub fn set_feed(&self, result: Result<Feed, ApiError>) {
        *self.feed.borrow_mut() = Some(result);
    }

    pub fn set_detail(&self, id: &str, result: Result<AgentDetail, ApiError>) {
        self.details.borrow_mut().insert(id.to_owned(), result);
    }

    pub fn set_timeline(&self, id: &str, lines: &[&str]) {
        self.timelines.borrow_mut().insert(
            id.to_owned(),
            Ok(TimelineResponse {
                animal_id: Some(AnimalId::from(id)),
                age_ticks: None,
                lines: lines.iter().map(|l| (*l).to_owned()).collect(),
            }),
        );
    }

    /// Script an animal that exists, with detail and a one-line timeline.
    pub fn add_animal(&self, id: &str, age: u64) {
        self.set_detail(id, Ok(detail(id, age)));
        self.set_timeline(id, &["It woke."]);
    }

    pub fn set_birth(&self, result: Result<BirthReceipt, ApiError>) {
        *self.birth.borrow_mut() = Some(result);
    }

    pub fn set_config(&self, result: Result<PublicConfig, ApiError>) {
        *self.config.borrow_mut() = Some(result);
    }

    pub fn set_me(&self, result: Result<WhoAmI, ApiError>) {
        *self.me.borrow_mut() = Some(result);
    }

    pub fn set_grant(&self, result: Result<AuthGrant, ApiError>) {
        *self.grant.borrow_mut() = Some(result);
    }

    /// Make the detail fetch for `id` wait until the returned gate is notified.
    pub fn gate(&self, id: &str) -> Rc<Notify> {
        let gate = Rc::new(Notify::new());
        self.gates
            .borrow_mut()
            .insert(id.to_owned(), Rc::clone(&gate));
        gate
    }

    /// Make the next `animals` or `feed` call wait until the returned gate
    /// is notified. The response is the one scripted when the call was made.
    pub fn hold_next(&self, endpoint: &'static str) -> Rc<Notify> {
        let gate = Rc::new(Notify::new());
        self.held.borrow_mut().insert(endpoint, Rc::clone(&gate));
        gate
    }

    async fn release(&self, endpoint: &'static str) {
        let gate = self.held.borrow_mut().remove(endpoint);
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }

    pub fn count(&self, endpoint: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.endpoint == endpoint)
            .count()
    }

    pub fn calls_to(&self, endpoint: &str) -> Vec<Call> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.endpoint == endpoint)
            .cloned()
            .collect()
    }

    fn record(&self, endpoint: &'static str, arg: Option<&str>, credential: Option<&str>) {
        self.calls.borrow_mut().push(Call {
            endpoint,
            arg: arg.map(ToOwned::to_owned),
            credential: credential.map(ToOwned::to_owned),
        });
    }

    fn scripted<T: Clone>(
        slot: &RefCell<Option<Result<T, ApiError>>>,
        what: &str,
    ) -> Result<T, ApiError> {
        slot.borrow()
            .clone()
            .unwrap_or_else(|| Err(not_scripted(what)))
    }
}

fn not_scripted(what: &str) -> ApiError {
    ApiError::Transport {
        message: format!("{what} not scripted"),
    }
}

impl AnimalApi for FakeApi {
    async fn list_animals(
        &self,
        creator: Option<&CreatorKey>,
        credential: Option<&str>,
    ) -> Result<AnimalList, ApiError> {
        match creator {
            None => {
                self.record("animals", None, credential);
                let result = Self::scripted(&self.animals, "animals");
                self.release("animals").await;
                result
            }
            Some(key) => {
                self.record("your_animals", Some(key.as_str()), credential);
                Self::scripted(&self.your_animals, "your_animals")
            }
        }
    }

    async fn animal_detail(&self, id: &AnimalId) -> Result<AgentDetail, ApiError> {
        self.record("detail", Some(id.as_str()), None);
        let gate = self.gates.borrow().get(id.as_str()).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.details
            .borrow()
            .get(id.as_str())
            .cloned()
            .unwrap_or_else(|| Err(status(404, "not_found")))
    }

    async fn timeline(&self, id: &AnimalId) -> Result<TimelineResponse, ApiError> {
        self.record("timeline", Some(id.as_str()), None);
        self.timelines
            .borrow()
            .get(id.as_str())
            .cloned()
            .unwrap_or_else(|| Err(status(404, "not_found")))
    }

    async fn feed(&self) -> Result<Feed, ApiError> {
        self.record("feed", None, None);
        let result = Self::scripted(&self.feed, "feed");
        self.release("feed").await;
        result
    }

    async fn birth(
        &self,
        request: &BirthRequest,
        credential: Option<&str>,
    ) -> Result<BirthReceipt, ApiError> {
        self.record(
            "birth",
            request.creator_id.as_ref().map(CreatorKey::as_str),
            credential,
        );
        Self::scripted(&self.birth, "birth")
    }

    async fn public_config(&self) -> Result<PublicConfig, ApiError> {
        self.record("config", None, None);
        Self::scripted(&self.config, "config")
    }

    async fn who_am_i(&self, credential: &str) -> Result<WhoAmI, ApiError> {
        self.record("me", None, Some(credential));
        Self::scripted(&self.me, "me")
    }

    async fn exchange_credential(
        &self,
        assertion: &GoogleCredential,
    ) -> Result<AuthGrant, ApiError> {
        self.record("google", Some(&assertion.credential), None);
        Self::scripted(&self.grant, "grant")
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub type TestEngine = SyncEngine<FakeApi, MemoryStore, RecordingRenderer>;

pub const INTERVAL: Duration = Duration::from_secs(25);

pub fn engine(api: FakeApi, policy: IdentityPolicy) -> TestEngine {
    engine_with_store(api, policy, MemoryStore::new())
}

pub fn engine_with_credential(api: FakeApi, policy: IdentityPolicy, token: &str) -> TestEngine {
    let mut store = MemoryStore::new();
    store.set(AUTH_TOKEN_KEY, token).unwrap();
    engine_with_store(api, policy, store)
}

pub fn engine_with_store(api: FakeApi, policy: IdentityPolicy, store: MemoryStore) -> TestEngine {
    let identity = IdentityResolver::new(policy, BestEffortStore::new(store), None);
    SyncEngine::new(api, identity, RecordingRenderer::default(), INTERVAL).with_seed(7)
}

pub fn agent(id: &str, age: u64) -> Agent {
    serde_json::from_value(serde_json::json!({
        "animal_id": id,
        "age_ticks": age,
        "phase": "infant",
        "species": "fox"
    }))
    .unwrap()
}

pub fn agents(list: &[(&str, u64)]) -> AnimalList {
    AnimalList {
        animals: list.iter().map(|(id, age)| agent(id, *age)).collect(),
    }
}

pub fn detail(id: &str, age: u64) -> AgentDetail {
    AgentDetail {
        agent: agent(id, age),
        memory_count: Some(1),
        expressions_count: Some(0),
        last_activity: None,
    }
}

pub fn post(id: &str, tick: u64, public_tick: Option<u64>) -> Post {
    Post {
        animal_id: AnimalId::from(id),
        tick,
        public_tick,
        sentences: vec!["It listens.".to_owned()],
        phase: "infant".to_owned(),
        species: None,
        creator: None,
        slug: None,
    }
}

pub const fn feed(posts: Vec<Post>) -> Feed {
    Feed { posts }
}

pub fn status(status: u16, code: &str) -> ApiError {
    ApiError::Status {
        status,
        code: code.to_owned(),
        message: None,
    }
}

pub fn transport() -> ApiError {
    ApiError::Transport {
        message: "connection refused".to_owned(),
    }
}

pub fn generic(status_code: u16) -> ApiError {
    status(status_code, GENERIC_ERROR_CODE)
}
