//! Authentication view state.
//!
//! ```text
//! SignedOut --begin_exchange--> PendingExchange --complete--> SignedIn
//!     ^                               |                          |
//!     +-------------fail--------------+                          |
//!     +-----------sign_out / any 401-----------------------------+
//! ```
//!
//! The network side of each transition lives in the synchronization loop;
//! this module only holds the state and enforces legal moves.

use crate::error::SignInError;

/// Where the visitor is in the sign-in flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AuthPhase {
    /// No session.
    #[default]
    SignedOut,
    /// An assertion is being exchanged for a bearer credential.
    PendingExchange,
    /// A server-validated session is active.
    SignedIn,
}

/// What the server advertised about the external identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProviderState {
    /// Not asked yet. The provider is only looked up when a sign-in
    /// prompt is first shown.
    #[default]
    Unknown,
    /// The provider is configured with this client id.
    Configured {
        /// OAuth client id for the provider widget.
        client_id: String,
    },
    /// The server has no provider; sign-in cannot work.
    NotConfigured,
}

/// Authentication state the presentation layer renders.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthView {
    phase: AuthPhase,
    username: Option<String>,
    prompt_open: bool,
    provider: ProviderState,
    notice: Option<String>,
}

impl AuthView {
    /// Current phase.
    pub const fn phase(&self) -> AuthPhase {
        self.phase
    }

    /// Display name while signed in.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Whether the sign-in prompt is showing.
    pub const fn prompt_open(&self) -> bool {
        self.prompt_open
    }

    /// Provider configuration as last fetched.
    pub const fn provider(&self) -> &ProviderState {
        &self.provider
    }

    /// Inline notice near the sign-in controls.
    ///
    /// A missing provider yields a persistent configuration notice; other
    /// failures leave a short message that the next attempt replaces.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub(crate) fn open_prompt(&mut self) {
        self.prompt_open = true;
        if self.provider == ProviderState::NotConfigured {
            self.notice = Some(SignInError::NotConfigured.to_string());
        }
    }

    pub(crate) const fn close_prompt(&mut self) {
        self.prompt_open = false;
    }

    pub(crate) fn set_provider(&mut self, provider: ProviderState) {
        if provider == ProviderState::NotConfigured {
            self.notice = Some(SignInError::NotConfigured.to_string());
        }
        self.provider = provider;
    }

    pub(crate) fn set_notice(&mut self, notice: Option<String>) {
        self.notice = notice;
    }

    /// Move to [`AuthPhase::PendingExchange`].
    pub(crate) fn begin_exchange(&mut self) -> Result<(), SignInError> {
        match self.phase {
            AuthPhase::SignedOut => {
                self.phase = AuthPhase::PendingExchange;
                self.notice = None;
                Ok(())
            }
            AuthPhase::PendingExchange | AuthPhase::SignedIn => Err(SignInError::AlreadyInProgress),
        }
    }

    /// Enter [`AuthPhase::SignedIn`]. Also used when restoring a stored
    /// session, which skips the pending phase.
    pub(crate) fn complete(&mut self, username: String) {
        self.phase = AuthPhase::SignedIn;
        self.username = Some(username);
        self.prompt_open = false;
        self.notice = None;
    }

    /// Abandon a pending exchange.
    pub(crate) fn fail(&mut self, message: String) {
        self.phase = AuthPhase::SignedOut;
        self.username = None;
        self.notice = Some(message);
    }

    /// Return to [`AuthPhase::SignedOut`].
    pub(crate) fn sign_out(&mut self) {
        self.phase = AuthPhase::SignedOut;
        self.username = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path() {
        let mut view = AuthView::default();
        assert_eq!(view.phase(), AuthPhase::SignedOut);
        view.open_prompt();
        assert!(view.begin_exchange().is_ok());
        assert_eq!(view.phase(), AuthPhase::PendingExchange);
        view.complete("wren".to_owned());
        assert_eq!(view.phase(), AuthPhase::SignedIn);
        assert_eq!(view.username(), Some("wren"));
        assert!(!view.prompt_open());
    }

    #[test]
    fn exchange_cannot_start_twice() {
        let mut view = AuthView::default();
        assert!(view.begin_exchange().is_ok());
        assert_eq!(view.begin_exchange(), Err(SignInError::AlreadyInProgress));
        view.fail("invalid_credential".to_owned());
        assert_eq!(view.phase(), AuthPhase::SignedOut);
        assert_eq!(view.notice(), Some("invalid_credential"));
        assert!(view.begin_exchange().is_ok());
        assert_eq!(view.notice(), None);
    }

    #[test]
    fn missing_provider_is_a_persistent_notice() {
        let mut view = AuthView::default();
        view.set_provider(ProviderState::NotConfigured);
        view.set_notice(None);
        view.open_prompt();
        assert_eq!(
            view.notice(),
            Some("sign-in is not configured on this server")
        );
    }

    #[test]
    fn sign_out_clears_username() {
        let mut view = AuthView::default();
        view.complete("wren".to_owned());
        view.sign_out();
        assert_eq!(view.phase(), AuthPhase::SignedOut);
        assert_eq!(view.username(), None);
    }
}
