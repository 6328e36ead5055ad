//! Identity Resolver.
//!
//! Decides which creator the current visitor is. One resolver covers every
//! identity policy; the policy is configuration, not a separate code path.
//!
//! Resolution order:
//!
//! 1. A server-validated session (see [`IdentityResolver::accept_session`]).
//! 2. The anonymous token from durable storage.
//! 3. A freshly generated anonymous token, persisted and mirrored into a
//!    cookie.
//!
//! Under [`IdentityPolicy::AuthRequired`] steps 2 and 3 are skipped and a
//! signed-out visitor has no creator key at all.

use rand::Rng;
use serde::Deserialize;
use tracing::{debug, info};

use openanimal_types::{CreatorKey, UserId};

use crate::storage::{
    ANON_ID_KEY, AUTH_TOKEN_KEY, BestEffortStore, CookieMirror, KeyValueStore, user_creator_key,
};

/// Prefix of every anonymous token.
pub const ANON_TOKEN_PREFIX: &str = "anon_";

/// Number of base-36 characters after the prefix (36^8 combinations).
pub const ANON_TOKEN_LEN: usize = 8;

/// Which identities may birth animals and own "your animals".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
pub enum IdentityPolicy {
    /// Every visitor gets an anonymous token; there is no sign-in.
    #[default]
    #[serde(rename = "anonymous")]
    AlwaysAnonymous,
    /// Anonymous by default; signing in switches to the user's identity.
    #[serde(rename = "optional")]
    AuthOptional,
    /// Only signed-in visitors have a creator key.
    #[serde(rename = "required")]
    AuthRequired,
}

impl IdentityPolicy {
    /// Parse the configuration spelling (`anonymous`, `optional`, `required`).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "anonymous" => Some(Self::AlwaysAnonymous),
            "optional" => Some(Self::AuthOptional),
            "required" => Some(Self::AuthRequired),
            _ => None,
        }
    }

    /// Whether this policy offers sign-in at all.
    pub const fn allows_sign_in(self) -> bool {
        !matches!(self, Self::AlwaysAnonymous)
    }
}

/// An authenticated user as the server validated it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// The authenticated user.
    pub user_id: UserId,
    /// Display name.
    pub username: String,
    /// Creator key used for this session. Starts as the user id; a birth
    /// may replace it with a server-assigned key.
    pub creator: CreatorKey,
}

/// The visitor's current identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// Identified by a client-generated token.
    Anonymous {
        /// The anonymous creator key.
        token: CreatorKey,
    },
    /// Signed in.
    Authenticated(Session),
    /// Signed out under a policy that requires sign-in.
    Unidentified,
}

impl Identity {
    /// Creator key for "your animals" and birth, if any.
    pub fn creator_key(&self) -> Option<&CreatorKey> {
        match self {
            Self::Anonymous { token } => Some(token),
            Self::Authenticated(session) => Some(&session.creator),
            Self::Unidentified => None,
        }
    }
}

/// Resolves and persists the visitor's identity.
#[derive(Debug)]
pub struct IdentityResolver<S> {
    policy: IdentityPolicy,
    store: BestEffortStore<S>,
    cookie: Option<CookieMirror>,
    anon: Option<CreatorKey>,
    session: Option<Session>,
}

impl<S: KeyValueStore> IdentityResolver<S> {
    /// Create a resolver over a durable store.
    pub const fn new(
        policy: IdentityPolicy,
        store: BestEffortStore<S>,
        cookie: Option<CookieMirror>,
    ) -> Self {
        Self {
            policy,
            store,
            cookie,
            anon: None,
            session: None,
        }
    }

    /// The configured policy.
    pub const fn policy(&self) -> IdentityPolicy {
        self.policy
    }

    /// Current identity. Idempotent; the only side effect is provisioning
    /// an anonymous token the first time one is needed.
    pub fn resolve(&mut self) -> Identity {
        if let Some(session) = &self.session {
            return Identity::Authenticated(session.clone());
        }
        if self.policy == IdentityPolicy::AuthRequired {
            return Identity::Unidentified;
        }
        Identity::Anonymous {
            token: self.anon_token(),
        }
    }

    /// Creator key of the current identity.
    pub fn creator_key(&mut self) -> Option<CreatorKey> {
        match self.resolve() {
            Identity::Anonymous { token } => Some(token),
            Identity::Authenticated(session) => Some(session.creator),
            Identity::Unidentified => None,
        }
    }

    /// Current session, if signed in.
    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Whether the visitor is signed in.
    pub const fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Whether a birth may be issued without signing in first.
    pub const fn can_birth(&self) -> bool {
        self.session.is_some() || !matches!(self.policy, IdentityPolicy::AuthRequired)
    }

    /// The durable bearer credential, if one is stored.
    pub fn stored_credential(&mut self) -> Option<String> {
        self.store
            .get(AUTH_TOKEN_KEY)
            .filter(|token| !token.trim().is_empty())
    }

    /// Switch to a server-validated session.
    ///
    /// `credential` is persisted when given (a fresh exchange); a restored
    /// session passes `None` because its credential is already stored.
    /// The creator key is the user id unless the server assigned this user
    /// another one on an earlier birth.
    pub fn accept_session(&mut self, user_id: UserId, username: String, credential: Option<&str>) {
        if let Some(token) = credential {
            self.store.set(AUTH_TOKEN_KEY, token);
        }
        let creator = self
            .store
            .get(&user_creator_key(user_id.as_str()))
            .filter(|key| !key.trim().is_empty())
            .map_or_else(|| CreatorKey::from(user_id.clone()), CreatorKey::from);
        info!(user_id = %user_id, creator = %creator, "signed in");
        self.session = Some(Session {
            creator,
            user_id,
            username,
        });
    }

    /// Drop the authenticated state and its stored credential.
    ///
    /// The anonymous token is never deleted, so an optional-auth visitor
    /// falls back to the animals they birthed anonymously.
    pub fn clear_identity(&mut self) {
        if let Some(session) = self.session.take() {
            info!(user_id = %session.user_id, "signed out");
        }
        self.store.remove(AUTH_TOKEN_KEY);
    }

    /// Adopt a creator key the server assigned on birth.
    ///
    /// Anonymous identities overwrite and persist their token. A session
    /// persists the key under a slot for its user, so signing in again
    /// restores it; the anonymous token is untouched. Returns whether the
    /// key changed.
    pub fn adopt_server_creator(&mut self, key: &CreatorKey) -> bool {
        if key.is_empty() {
            return false;
        }
        if let Some(session) = self.session.as_mut() {
            if &session.creator == key {
                return false;
            }
            info!(user_id = %session.user_id, creator = %key, "adopting server-assigned creator for user");
            session.creator = key.clone();
            self.store
                .set(&user_creator_key(session.user_id.as_str()), key.as_str());
            return true;
        }
        if self.anon.as_ref() == Some(key) {
            return false;
        }
        info!(creator = %key, "adopting server-assigned anonymous creator");
        self.persist_anon(key);
        true
    }

    /// Mutable access to the underlying store, for other persisted slots.
    pub const fn storage_mut(&mut self) -> &mut BestEffortStore<S> {
        &mut self.store
    }

    fn anon_token(&mut self) -> CreatorKey {
        if let Some(token) = &self.anon {
            return token.clone();
        }
        if let Some(stored) = self.store.get(ANON_ID_KEY).filter(|t| !t.is_empty()) {
            let token = CreatorKey::from(stored);
            if let Some(cookie) = &self.cookie {
                cookie.mirror_anon_id(token.as_str());
            }
            self.anon = Some(token.clone());
            return token;
        }
        let token = generate_anon_token(&mut rand::rng());
        debug!(creator = %token, "provisioned anonymous identity");
        self.persist_anon(&token);
        token
    }

    fn persist_anon(&mut self, token: &CreatorKey) {
        self.store.set(ANON_ID_KEY, token.as_str());
        if let Some(cookie) = &self.cookie {
            cookie.mirror_anon_id(token.as_str());
        }
        self.anon = Some(token.clone());
    }
}

/// Generate `anon_` followed by eight random base-36 characters.
pub fn generate_anon_token<R: Rng>(rng: &mut R) -> CreatorKey {
    let suffix: String = (0..ANON_TOKEN_LEN)
        .filter_map(|_| char::from_digit(rng.random_range(0..36), 36))
        .collect();
    CreatorKey::new(format!("{ANON_TOKEN_PREFIX}{suffix}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::storage::{DisabledStore, MemoryStore};

    fn resolver(policy: IdentityPolicy) -> IdentityResolver<MemoryStore> {
        IdentityResolver::new(policy, BestEffortStore::new(MemoryStore::new()), None)
    }

    #[test]
    fn token_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let token = generate_anon_token(&mut rng);
        let suffix = token.as_str().strip_prefix(ANON_TOKEN_PREFIX).unwrap();
        assert_eq!(suffix.len(), ANON_TOKEN_LEN);
        assert!(
            suffix
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
        );
    }

    #[test]
    fn resolve_is_idempotent_and_persists() {
        let mut ids = resolver(IdentityPolicy::AlwaysAnonymous);
        let first = ids.creator_key().unwrap();
        let second = ids.creator_key().unwrap();
        assert_eq!(first, second);
        assert_eq!(
            ids.storage_mut().get(ANON_ID_KEY).as_deref(),
            Some(first.as_str())
        );
    }

    #[test]
    fn stored_token_is_reused() {
        let mut inner = MemoryStore::new();
        inner.set(ANON_ID_KEY, "anon_stored01").unwrap();
        let mut ids = IdentityResolver::new(
            IdentityPolicy::AuthOptional,
            BestEffortStore::new(inner),
            None,
        );
        assert_eq!(ids.creator_key().unwrap().as_str(), "anon_stored01");
    }

    #[test]
    fn disabled_storage_keeps_session_token() {
        let mut ids = IdentityResolver::new(
            IdentityPolicy::AlwaysAnonymous,
            BestEffortStore::new(DisabledStore),
            None,
        );
        let first = ids.creator_key().unwrap();
        assert_eq!(ids.creator_key().unwrap(), first);
        assert!(ids.storage_mut().is_degraded());
    }

    #[test]
    fn required_policy_has_no_creator_until_signed_in() {
        let mut ids = resolver(IdentityPolicy::AuthRequired);
        assert_eq!(ids.resolve(), Identity::Unidentified);
        assert!(!ids.can_birth());
        ids.accept_session(UserId::from("u-42"), "kit".to_owned(), Some("bearer-1"));
        assert_eq!(ids.creator_key().unwrap().as_str(), "u-42");
        assert_eq!(ids.stored_credential().as_deref(), Some("bearer-1"));
        ids.clear_identity();
        assert_eq!(ids.creator_key(), None);
        assert_eq!(ids.stored_credential(), None);
    }

    #[test]
    fn sign_out_keeps_anonymous_token() {
        let mut ids = resolver(IdentityPolicy::AuthOptional);
        let anon = ids.creator_key().unwrap();
        ids.accept_session(UserId::from("u-1"), "ren".to_owned(), Some("t"));
        assert_ne!(ids.creator_key().unwrap(), anon);
        ids.clear_identity();
        assert_eq!(ids.creator_key().unwrap(), anon);
    }

    #[test]
    fn server_creator_overwrites_anonymous_token() {
        let mut ids = resolver(IdentityPolicy::AlwaysAnonymous);
        let _ = ids.creator_key();
        let assigned = CreatorKey::from("anon_server01");
        assert!(ids.adopt_server_creator(&assigned));
        assert!(!ids.adopt_server_creator(&assigned));
        assert_eq!(ids.creator_key().unwrap(), assigned);
        assert_eq!(
            ids.storage_mut().get(ANON_ID_KEY).as_deref(),
            Some("anon_server01")
        );
    }

    #[test]
    fn server_creator_for_user_survives_sign_in_again() {
        let mut ids = resolver(IdentityPolicy::AuthOptional);
        let anon = ids.creator_key().unwrap();
        ids.accept_session(UserId::from("u-9"), "ash".to_owned(), None);
        assert!(ids.adopt_server_creator(&CreatorKey::from("creator-9")));
        assert_eq!(ids.creator_key().unwrap().as_str(), "creator-9");
        assert_eq!(
            ids.storage_mut().get(&user_creator_key("u-9")).as_deref(),
            Some("creator-9")
        );
        assert_eq!(
            ids.storage_mut().get(ANON_ID_KEY).as_deref(),
            Some(anon.as_str())
        );

        ids.clear_identity();
        assert_eq!(ids.creator_key().unwrap(), anon);
        ids.accept_session(UserId::from("u-9"), "ash".to_owned(), None);
        assert_eq!(ids.creator_key().unwrap().as_str(), "creator-9");

        // Another user on the same device keeps their own key.
        ids.clear_identity();
        ids.accept_session(UserId::from("u-10"), "bo".to_owned(), None);
        assert_eq!(ids.creator_key().unwrap().as_str(), "u-10");
    }

    #[test]
    fn policy_parsing() {
        assert_eq!(
            IdentityPolicy::parse("Required"),
            Some(IdentityPolicy::AuthRequired)
        );
        assert_eq!(IdentityPolicy::parse("nope"), None);
        assert!(!IdentityPolicy::AlwaysAnonymous.allows_sign_in());
    }
}
