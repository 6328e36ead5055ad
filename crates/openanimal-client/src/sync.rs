//! Synchronization Loop.
//!
//! [`SyncEngine`] keeps the [`ViewModelStore`] eventually consistent with
//! the server. It runs on one cooperative execution context: every
//! operation takes `&self`, state lives behind `RefCell`s that are never
//! borrowed across an `.await`, and concurrent work (a poll overlapping a
//! user action) interleaves only at await points.
//!
//! # Pass structure
//!
//! A full pass refreshes four sub-resources, issued in this order and
//! awaited together:
//!
//! 1. all animals (advances the tick watermark)
//! 2. "your animals" for the resolved creator key, skipped without one
//! 3. the feed (advances the tick watermark)
//! 4. the selected animal's detail and timeline
//!
//! Each sub-resource lands in the store as soon as its response arrives;
//! there is no cross-resource atomicity. A failure touches only its own
//! sub-resource and the previous snapshot stays on screen.
//!
//! # Selection race
//!
//! Detail/timeline fetches carry a [`SelectionTicket`]. If the visitor
//! picks another animal while a fetch is in flight, the ticket goes stale
//! and the late result is discarded instead of overwriting the new
//! selection.
//!
//! # Overlapping passes
//!
//! A user action can start a pass while a timer pass is still waiting on
//! the network. Every request is numbered per resource
//! ([`RequestSeq`](crate::store::RequestSeq)), and a response older than
//! the last one applied is discarded, so a slow early response never
//! replaces a newer snapshot. The timer skips its tick while any pass is
//! still running.

use std::cell::{Ref, RefCell};
use std::time::Duration;

use chrono::Utc;
use futures::future::LocalBoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use openanimal_types::{AnimalId, BirthRequest, CreatorKey, GoogleCredential, Post};

use crate::api::AnimalApi;
use crate::auth::ProviderState;
use crate::display::species_label;
use crate::error::{ApiError, BirthError, ErrorKind, SignInError};
use crate::identity::{IdentityPolicy, IdentityResolver};
use crate::presence::check_return;
use crate::render::{Region, RenderSink};
use crate::scheduler::PollScheduler;
use crate::storage::KeyValueStore;
use crate::store::{FeedSort, RequestSeq, Resource, SelectionTicket, ViewModelStore};

/// Birth message while the request is in flight.
pub const BIRTH_PENDING_MESSAGE: &str = "Creating...";

/// Birth message when the server gave no reason.
pub const BIRTH_FAILED_MESSAGE: &str = "Birth failed.";

/// Sign-in notice when the provider configuration could not be fetched.
pub const SIGN_IN_UNAVAILABLE: &str = "Sign-in is unavailable right now.";

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// How one sub-resource refresh settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// A fresh snapshot replaced the old one.
    Updated,
    /// Nothing to fetch (no creator key, no selection).
    Skipped,
    /// The request failed; the previous snapshot was kept.
    Failed(ErrorKind),
    /// The result arrived for a context that no longer applies, or a
    /// response to a later request already landed.
    Discarded,
    /// The selected animal no longer exists; the selection was cleared.
    SelectionCleared,
}

/// Outcome of one full synchronization pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassReport {
    /// All animals.
    pub animals: StepOutcome,
    /// "Your animals".
    pub your_animals: StepOutcome,
    /// The feed.
    pub feed: StepOutcome,
    /// Selected animal detail and timeline.
    pub selection: StepOutcome,
}

impl PassReport {
    /// Outcomes in pass order.
    pub const fn outcomes(&self) -> [(Resource, StepOutcome); 4] {
        [
            (Resource::Animals, self.animals),
            (Resource::YourAnimals, self.your_animals),
            (Resource::Feed, self.feed),
            (Resource::Selection, self.selection),
        ]
    }

    /// Whether any step failed.
    pub fn any_failed(&self) -> bool {
        self.outcomes()
            .iter()
            .any(|(_, outcome)| matches!(outcome, StepOutcome::Failed(_)))
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// User actions fed into [`SyncEngine::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run a full pass now.
    Refresh,
    /// Select an animal and load its detail and timeline.
    Select(AnimalId),
    /// Show the "none selected" state.
    ClearSelection,
    /// Change the feed ordering.
    SetSort(FeedSort),
    /// Birth a new animal.
    Birth,
    /// Show the sign-in prompt.
    OpenSignIn,
    /// Exchange a provider assertion for a session.
    SignIn(String),
    /// Drop the session.
    SignOut,
    /// Stop the loop.
    Shutdown,
}

// ---------------------------------------------------------------------------
// Refresh indicator guard
// ---------------------------------------------------------------------------

/// Marks a resource as refreshing for as long as it lives, and numbers
/// the request it covers.
struct RefreshGuard<'a> {
    store: &'a RefCell<ViewModelStore>,
    resource: Resource,
    seq: RequestSeq,
}

impl<'a> RefreshGuard<'a> {
    fn new(store: &'a RefCell<ViewModelStore>, resource: Resource) -> Self {
        let seq = {
            let mut store = store.borrow_mut();
            store.refreshing_mut().begin(resource);
            store.issue_request(resource)
        };
        Self {
            store,
            resource,
            seq,
        }
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.store
            .borrow_mut()
            .refreshing_mut()
            .end(self.resource);
    }
}

/// Counts a full pass as running for as long as it lives.
struct PassGuard<'a>(&'a RefCell<ViewModelStore>);

impl<'a> PassGuard<'a> {
    fn new(store: &'a RefCell<ViewModelStore>) -> Self {
        store.borrow_mut().refreshing_mut().begin_pass();
        Self(store)
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.borrow_mut().refreshing_mut().end_pass();
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The synchronization engine: owns the store and drives every refresh.
pub struct SyncEngine<A, S, R> {
    api: A,
    identity: RefCell<IdentityResolver<S>>,
    store: RefCell<ViewModelStore>,
    renderer: RefCell<R>,
    rng: RefCell<StdRng>,
    poll_interval: Duration,
}

impl<A, S, R> SyncEngine<A, S, R>
where
    A: AnimalApi,
    S: KeyValueStore,
    R: RenderSink,
{
    /// Assemble an engine.
    pub fn new(
        api: A,
        identity: IdentityResolver<S>,
        renderer: R,
        poll_interval: Duration,
    ) -> Self {
        Self {
            api,
            identity: RefCell::new(identity),
            store: RefCell::new(ViewModelStore::new()),
            renderer: RefCell::new(renderer),
            rng: RefCell::new(StdRng::from_rng(&mut rand::rng())),
            poll_interval,
        }
    }

    /// Use a deterministic random source (feed shuffle, return nudge).
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        *self.rng.get_mut() = StdRng::seed_from_u64(seed);
        self
    }

    /// Read-only view of the store.
    pub fn store(&self) -> Ref<'_, ViewModelStore> {
        self.store.borrow()
    }

    /// Read-only view of the renderer.
    pub fn renderer(&self) -> Ref<'_, R> {
        self.renderer.borrow()
    }

    /// The API implementation.
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// Creator key of the current identity.
    pub fn creator_key(&self) -> Option<CreatorKey> {
        self.identity.borrow_mut().creator_key()
    }

    /// Whether a full pass is still waiting on the network.
    pub fn pass_in_flight(&self) -> bool {
        self.store.borrow().refreshing().pass_in_flight()
    }

    /// Whether a session is active.
    pub fn is_authenticated(&self) -> bool {
        self.identity.borrow().is_authenticated()
    }

    /// The feed ordered by the active sort mode. Shuffle draws a new
    /// permutation on every call.
    pub fn sorted_feed(&self) -> Vec<Post> {
        let mut rng = self.rng.borrow_mut();
        self.store.borrow().sorted_feed(&mut *rng)
    }

    fn render(&self, region: Region) {
        let store = self.store.borrow();
        self.renderer.borrow_mut().render(region, &store);
    }

    /// Credential to attach to calls that require authentication.
    fn session_credential(&self) -> Option<String> {
        let mut identity = self.identity.borrow_mut();
        if identity.is_authenticated() {
            identity.stored_credential()
        } else {
            None
        }
    }

    // -- lifecycle --

    /// Initial load: return nudge, session restore, then a full pass.
    pub async fn start(&self) -> PassReport {
        info!(
            policy = ?self.identity.borrow().policy(),
            interval_secs = self.poll_interval.as_secs(),
            "synchronization starting"
        );
        self.show_return_message();
        self.restore_session().await;
        self.sync_pass().await
    }

    fn show_return_message(&self) {
        let message = {
            let mut identity = self.identity.borrow_mut();
            let mut rng = self.rng.borrow_mut();
            check_return(identity.storage_mut(), Utc::now(), &mut *rng)
        };
        if let Some(message) = message {
            debug!(nudge = message, "showing return nudge");
        }
        self.store
            .borrow_mut()
            .set_return_message(message.map(ToOwned::to_owned));
        self.render(Region::Presence);
    }

    /// Validate a stored credential against the server.
    ///
    /// A rejected credential is discarded. A transport failure leaves the
    /// visitor signed out for now but keeps the credential for next time.
    /// Returns whether a session was restored.
    pub async fn restore_session(&self) -> bool {
        let credential = {
            let mut identity = self.identity.borrow_mut();
            if identity.policy() == IdentityPolicy::AlwaysAnonymous {
                return false;
            }
            identity.stored_credential()
        };
        let Some(credential) = credential else {
            return false;
        };

        match self.api.who_am_i(&credential).await {
            Ok(me) => {
                let username = me.username.clone();
                self.identity
                    .borrow_mut()
                    .accept_session(me.user_id, me.username, None);
                self.store.borrow_mut().auth_mut().complete(username);
                self.render(Region::Auth);
                true
            }
            Err(e) if e.is_auth_failure() => {
                info!("stored credential rejected, discarding");
                self.downgrade_identity();
                false
            }
            Err(e) => {
                warn!(error = %e, "could not validate stored credential");
                false
            }
        }
    }

    /// Drop the session after the server rejected its credential.
    fn downgrade_identity(&self) {
        self.identity.borrow_mut().clear_identity();
        {
            let mut store = self.store.borrow_mut();
            store.auth_mut().sign_out();
            store.clear_your_animals();
        }
        self.render(Region::Auth);
        self.render(Region::YourAnimals);
    }

    // -- full pass --

    /// Run one full synchronization pass.
    ///
    /// Completes once all four steps have settled. Never fails: every
    /// error is handled per step and reported in the [`PassReport`].
    pub async fn sync_pass(&self) -> PassReport {
        let _running = PassGuard::new(&self.store);
        let (animals, your_animals, feed, selection) = tokio::join!(
            self.refresh_animals(),
            self.refresh_your_animals(),
            self.refresh_feed(),
            self.refresh_selection(),
        );
        let report = PassReport {
            animals,
            your_animals,
            feed,
            selection,
        };
        debug!(
            watermark = self.store.borrow().watermark(),
            failed = report.any_failed(),
            "pass complete"
        );
        report
    }

    async fn refresh_animals(&self) -> StepOutcome {
        let (seq, result) = {
            let refreshing = RefreshGuard::new(&self.store, Resource::Animals);
            (refreshing.seq, self.api.list_animals(None, None).await)
        };
        match result {
            Ok(list) => {
                if !self.store.borrow_mut().replace_animals(seq, list.animals) {
                    return superseded(Resource::Animals);
                }
                self.render(Region::Animals);
                StepOutcome::Updated
            }
            Err(e) => self.step_failed(Resource::Animals, &e),
        }
    }

    async fn refresh_your_animals(&self) -> StepOutcome {
        let creator = self.creator_key();
        let Some(creator) = creator else {
            self.store.borrow_mut().clear_your_animals();
            self.render(Region::YourAnimals);
            return StepOutcome::Skipped;
        };
        let credential = self.session_credential();

        let (seq, result) = {
            let refreshing = RefreshGuard::new(&self.store, Resource::YourAnimals);
            let result = self
                .api
                .list_animals(Some(&creator), credential.as_deref())
                .await;
            (refreshing.seq, result)
        };

        if self.creator_key().as_ref() != Some(&creator) {
            debug!(creator = %creator, "identity changed mid-flight, discarding your animals");
            return StepOutcome::Discarded;
        }
        match result {
            Ok(list) => {
                if !self.store.borrow_mut().replace_your_animals(seq, list.animals) {
                    return superseded(Resource::YourAnimals);
                }
                self.render(Region::YourAnimals);
                StepOutcome::Updated
            }
            Err(e) => {
                if e.is_auth_failure() && credential.is_some() {
                    self.downgrade_identity();
                }
                self.step_failed(Resource::YourAnimals, &e)
            }
        }
    }

    async fn refresh_feed(&self) -> StepOutcome {
        let (seq, result) = {
            let refreshing = RefreshGuard::new(&self.store, Resource::Feed);
            (refreshing.seq, self.api.feed().await)
        };
        match result {
            Ok(feed) => {
                if !self.store.borrow_mut().replace_feed(seq, feed.posts) {
                    return superseded(Resource::Feed);
                }
                self.render(Region::Feed);
                StepOutcome::Updated
            }
            Err(e) => self.step_failed(Resource::Feed, &e),
        }
    }

    async fn refresh_selection(&self) -> StepOutcome {
        let ticket = self.store.borrow().selection_ticket();
        match ticket {
            Some(ticket) => self.load_selection(ticket).await,
            None => {
                self.render(Region::Selection);
                StepOutcome::Skipped
            }
        }
    }

    async fn load_selection(&self, ticket: SelectionTicket) -> StepOutcome {
        let (seq, (detail, timeline)) = {
            let refreshing = RefreshGuard::new(&self.store, Resource::Selection);
            let results = tokio::join!(
                self.api.animal_detail(&ticket.animal_id),
                self.api.timeline(&ticket.animal_id),
            );
            (refreshing.seq, results)
        };

        let error = match (detail, timeline) {
            (Ok(detail), Ok(timeline)) => {
                let applied =
                    self.store
                        .borrow_mut()
                        .apply_selection(&ticket, seq, detail, timeline.lines);
                if !applied {
                    debug!(animal_id = %ticket.animal_id, "selection moved on or a newer fetch landed, discarding");
                    return StepOutcome::Discarded;
                }
                self.render(Region::Selection);
                return StepOutcome::Updated;
            }
            (Err(e), _) | (Ok(_), Err(e)) => e,
        };

        let stale = {
            let store = self.store.borrow();
            !store.is_current(&ticket) || store.is_superseded(Resource::Selection, seq)
        };
        if stale {
            debug!(animal_id = %ticket.animal_id, error = %error, "stale selection failed, ignoring");
            return StepOutcome::Discarded;
        }
        match error.kind() {
            ErrorKind::NotFound | ErrorKind::Validation => {
                info!(
                    animal_id = %ticket.animal_id,
                    status = error.status(),
                    "selected animal is gone, clearing selection"
                );
                self.store.borrow_mut().clear_selection_if(&ticket);
                self.render(Region::Selection);
                StepOutcome::SelectionCleared
            }
            ErrorKind::Transport | ErrorKind::Server | ErrorKind::Authentication => {
                self.step_failed(Resource::Selection, &error)
            }
        }
    }

    fn step_failed(&self, resource: Resource, error: &ApiError) -> StepOutcome {
        warn!(
            resource = resource.as_str(),
            status = error.status(),
            code = error.code(),
            error = %error,
            "refresh failed, keeping previous snapshot"
        );
        StepOutcome::Failed(error.kind())
    }

    // -- user actions --

    /// Select an animal and load its detail and timeline.
    pub async fn select(&self, animal_id: AnimalId) -> StepOutcome {
        let ticket = self.store.borrow_mut().select(animal_id);
        self.render(Region::Selection);
        self.load_selection(ticket).await
    }

    /// Clear the selection.
    pub fn clear_selection(&self) {
        self.store.borrow_mut().clear_selection();
        self.render(Region::Selection);
    }

    /// Change the feed ordering.
    pub fn set_feed_sort(&self, sort: FeedSort) {
        self.store.borrow_mut().set_feed_sort(sort);
        self.render(Region::Feed);
    }

    /// Birth a new animal, then resync with it selected.
    ///
    /// # Errors
    ///
    /// See [`BirthError`]. Every failure is also reflected in the store's
    /// birth message; none of them stop the loop.
    pub async fn birth(&self) -> Result<AnimalId, BirthError> {
        if self.store.borrow().birth_pending() {
            return Err(BirthError::InProgress);
        }
        let (allowed, creator) = {
            let mut identity = self.identity.borrow_mut();
            (identity.can_birth(), identity.creator_key())
        };
        if !allowed {
            info!("birth needs a signed-in identity, opening sign-in");
            self.set_birth_message(Some(BirthError::SignInRequired.to_string()));
            if let Err(e) = self.open_sign_in().await {
                debug!(error = %e, "sign-in prompt unavailable");
            }
            return Err(BirthError::SignInRequired);
        }
        let credential = self.session_credential();

        {
            let mut store = self.store.borrow_mut();
            store.set_birth_pending(true);
            store.set_birth_message(Some(BIRTH_PENDING_MESSAGE.to_owned()));
        }
        self.render(Region::Birth);

        let request = BirthRequest {
            creator_id: creator.clone(),
        };
        let result = self.api.birth(&request, credential.as_deref()).await;
        self.store.borrow_mut().set_birth_pending(false);

        match result {
            Ok(receipt) => {
                if let Some(assigned) = receipt
                    .creator()
                    .filter(|assigned| creator.as_ref() != Some(*assigned))
                {
                    self.identity.borrow_mut().adopt_server_creator(assigned);
                }
                info!(animal_id = %receipt.animal_id, "animal born");
                self.set_birth_message(Some(format!(
                    "Born: {}",
                    species_label(receipt.species.as_deref())
                )));
                let ticket = self.store.borrow_mut().select(receipt.animal_id.clone());
                debug!(animal_id = %ticket.animal_id, "selecting newborn");
                self.render(Region::Selection);
                self.sync_pass().await;
                Ok(receipt.animal_id)
            }
            Err(e) if e.is_auth_failure() => {
                warn!("birth rejected the session credential");
                self.downgrade_identity();
                self.set_birth_message(Some(BirthError::AuthenticationExpired.to_string()));
                if let Err(e) = self.open_sign_in().await {
                    debug!(error = %e, "sign-in prompt unavailable");
                }
                Err(BirthError::AuthenticationExpired)
            }
            Err(e) => {
                warn!(status = e.status(), code = e.code(), error = %e, "birth failed");
                let message = match &e {
                    ApiError::Status {
                        message: Some(message),
                        ..
                    } => message.clone(),
                    _ => BIRTH_FAILED_MESSAGE.to_owned(),
                };
                self.set_birth_message(Some(message.clone()));
                Err(match e.kind() {
                    ErrorKind::Validation | ErrorKind::NotFound => BirthError::Rejected { message },
                    ErrorKind::Transport | ErrorKind::Server | ErrorKind::Authentication => {
                        BirthError::Unavailable {
                            message: e.to_string(),
                        }
                    }
                })
            }
        }
    }

    fn set_birth_message(&self, message: Option<String>) {
        self.store.borrow_mut().set_birth_message(message);
        self.render(Region::Birth);
    }

    /// Show the sign-in prompt, fetching the provider configuration the
    /// first time.
    ///
    /// # Errors
    ///
    /// [`SignInError::NotConfigured`] when the server has no provider (or
    /// the policy never signs in); [`SignInError::Rejected`] when the
    /// configuration could not be fetched.
    pub async fn open_sign_in(&self) -> Result<(), SignInError> {
        if !self.identity.borrow().policy().allows_sign_in() {
            return Err(SignInError::NotConfigured);
        }
        self.store.borrow_mut().auth_mut().open_prompt();
        self.render(Region::Auth);

        let provider = self.store.borrow().auth().provider().clone();
        let provider = match provider {
            ProviderState::Unknown => match self.api.public_config().await {
                Ok(config) => {
                    let provider = config.provider_client_id().map_or(
                        ProviderState::NotConfigured,
                        |id| ProviderState::Configured {
                            client_id: id.to_owned(),
                        },
                    );
                    self.store.borrow_mut().auth_mut().set_provider(provider.clone());
                    self.render(Region::Auth);
                    provider
                }
                Err(e) => {
                    warn!(error = %e, "could not fetch sign-in configuration");
                    self.store
                        .borrow_mut()
                        .auth_mut()
                        .set_notice(Some(SIGN_IN_UNAVAILABLE.to_owned()));
                    self.render(Region::Auth);
                    return Err(SignInError::Rejected {
                        message: SIGN_IN_UNAVAILABLE.to_owned(),
                    });
                }
            },
            known => known,
        };

        match provider {
            ProviderState::NotConfigured => Err(SignInError::NotConfigured),
            ProviderState::Configured { .. } | ProviderState::Unknown => Ok(()),
        }
    }

    /// Exchange a provider assertion for a session, then resync.
    ///
    /// # Errors
    ///
    /// See [`SignInError`]. The store's auth notice carries the message.
    pub async fn sign_in(&self, assertion: String) -> Result<(), SignInError> {
        if !self.identity.borrow().policy().allows_sign_in()
            || *self.store.borrow().auth().provider() == ProviderState::NotConfigured
        {
            return Err(SignInError::NotConfigured);
        }
        self.store.borrow_mut().auth_mut().begin_exchange()?;
        self.render(Region::Auth);

        let result = self
            .api
            .exchange_credential(&GoogleCredential {
                credential: assertion,
            })
            .await;

        match result {
            Ok(grant) => {
                let username = grant.username.clone();
                self.identity.borrow_mut().accept_session(
                    grant.user_id,
                    grant.username,
                    Some(&grant.token),
                );
                self.store.borrow_mut().auth_mut().complete(username);
                self.render(Region::Auth);
                self.sync_pass().await;
                Ok(())
            }
            Err(e) => {
                warn!(status = e.status(), code = e.code(), "credential exchange failed");
                let message = e.user_message().to_owned();
                self.store.borrow_mut().auth_mut().fail(message.clone());
                self.render(Region::Auth);
                Err(SignInError::Rejected { message })
            }
        }
    }

    /// Drop the session and reload "your animals" for whatever identity
    /// remains.
    pub async fn sign_out(&self) -> StepOutcome {
        self.identity.borrow_mut().clear_identity();
        {
            let mut store = self.store.borrow_mut();
            store.auth_mut().sign_out();
            store.auth_mut().close_prompt();
            store.clear_your_animals();
        }
        self.render(Region::Auth);
        self.render(Region::YourAnimals);
        self.refresh_your_animals().await
    }

    // -- event loop --

    /// Drive the engine until [`Command::Shutdown`] arrives or the command
    /// channel closes.
    ///
    /// The initial load, every timer-driven pass and every user action
    /// share one cooperative loop, so a slow request never blocks input.
    /// Network-bound user actions re-arm the poll timer.
    pub async fn run(&self, mut commands: mpsc::Receiver<Command>) {
        let mut scheduler = PollScheduler::new(self.poll_interval);
        let mut in_flight: FuturesUnordered<LocalBoxFuture<'_, ()>> = FuturesUnordered::new();

        in_flight.push(self.start().map(|_| ()).boxed_local());
        scheduler.arm();

        loop {
            tokio::select! {
                () = scheduler.fired() => {
                    if self.pass_in_flight() {
                        debug!("previous pass still running, skipping poll");
                    } else {
                        debug!("poll timer fired");
                        in_flight.push(self.sync_pass().map(|_| ()).boxed_local());
                    }
                    scheduler.arm();
                }
                command = commands.recv() => {
                    let Some(command) = command else {
                        debug!("command channel closed");
                        break;
                    };
                    if command == Command::Shutdown {
                        break;
                    }
                    if let Some(work) = self.dispatch(command) {
                        in_flight.push(work);
                        scheduler.arm();
                    }
                }
                Some(()) = in_flight.next(), if !in_flight.is_empty() => {}
            }
        }

        scheduler.cancel();
        info!(abandoned = in_flight.len(), "synchronization stopped");
    }

    /// Apply a command. UI-only commands complete immediately and return
    /// `None`; network-bound ones return the work to drive.
    fn dispatch(&self, command: Command) -> Option<LocalBoxFuture<'_, ()>> {
        match command {
            Command::Refresh => Some(self.sync_pass().map(|_| ()).boxed_local()),
            Command::Select(animal_id) => Some(self.select(animal_id).map(|_| ()).boxed_local()),
            Command::ClearSelection => {
                self.clear_selection();
                None
            }
            Command::SetSort(sort) => {
                self.set_feed_sort(sort);
                None
            }
            Command::Birth => Some(
                async move {
                    if let Err(e) = self.birth().await {
                        debug!(error = %e, "birth did not complete");
                    }
                }
                .boxed_local(),
            ),
            Command::OpenSignIn => Some(
                async move {
                    if let Err(e) = self.open_sign_in().await {
                        debug!(error = %e, "sign-in prompt unavailable");
                    }
                }
                .boxed_local(),
            ),
            Command::SignIn(assertion) => Some(
                async move {
                    if let Err(e) = self.sign_in(assertion).await {
                        debug!(error = %e, "sign-in did not complete");
                    }
                }
                .boxed_local(),
            ),
            Command::SignOut => Some(self.sign_out().map(|_| ()).boxed_local()),
            Command::Shutdown => None,
        }
    }
}

fn superseded(resource: Resource) -> StepOutcome {
    debug!(resource = resource.as_str(), "a newer response already landed, discarding");
    StepOutcome::Discarded
}

impl<A, S, R> core::fmt::Debug for SyncEngine<A, S, R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}
