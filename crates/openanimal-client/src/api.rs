//! API Client.
//!
//! [`AnimalApi`] is the seam between the synchronization loop and the
//! network: one method per endpoint the client consumes. [`ApiClient`] is
//! the `reqwest` implementation.
//!
//! Every call either returns the decoded body or fails with an
//! [`ApiError`] carrying the HTTP status, so callers can tell an expired
//! credential apart from a validation or server error. Nothing here
//! retries; the periodic re-poll is the retry.

use std::future::Future;
use std::sync::Arc;

use reqwest::cookie::Jar;
use reqwest::{Method, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use openanimal_types::{
    AgentDetail, AnimalId, AnimalList, AuthGrant, BirthReceipt, BirthRequest, CreatorKey,
    ErrorEnvelope, Feed, GoogleCredential, PublicConfig, TimelineResponse, WhoAmI,
};

use crate::config::ClientConfig;
use crate::error::{ApiError, ConfigError, GENERIC_ERROR_CODE};
use crate::storage::CookieMirror;

/// The endpoints the client consumes.
///
/// `credential` parameters carry the bearer token for calls that require
/// authentication; `None` sends the request without an `Authorization`
/// header.
pub trait AnimalApi {
    /// `GET /api/animals[?creator=<key>]`.
    fn list_animals(
        &self,
        creator: Option<&CreatorKey>,
        credential: Option<&str>,
    ) -> impl Future<Output = Result<AnimalList, ApiError>>;

    /// `GET /api/animals/{id}`.
    fn animal_detail(&self, id: &AnimalId) -> impl Future<Output = Result<AgentDetail, ApiError>>;

    /// `GET /api/animals/{id}/timeline`.
    fn timeline(&self, id: &AnimalId) -> impl Future<Output = Result<TimelineResponse, ApiError>>;

    /// `GET /api/feed`.
    fn feed(&self) -> impl Future<Output = Result<Feed, ApiError>>;

    /// `POST /api/animals/birth`.
    fn birth(
        &self,
        request: &BirthRequest,
        credential: Option<&str>,
    ) -> impl Future<Output = Result<BirthReceipt, ApiError>>;

    /// `GET /api/config`.
    fn public_config(&self) -> impl Future<Output = Result<PublicConfig, ApiError>>;

    /// `GET /api/auth/me`.
    fn who_am_i(&self, credential: &str) -> impl Future<Output = Result<WhoAmI, ApiError>>;

    /// `POST /api/auth/google`.
    fn exchange_credential(
        &self,
        assertion: &GoogleCredential,
    ) -> impl Future<Output = Result<AuthGrant, ApiError>>;
}

/// HTTP implementation of [`AnimalApi`].
///
/// Cookies set through [`ApiClient::cookie_mirror`] are sent with every
/// request to the API origin.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    jar: Arc<Jar>,
}

impl ApiClient {
    /// Build a client for `config.api_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the URL does not parse or the
    /// HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        Self::with_base_url(&config.api_url)
    }

    /// Build a client for an explicit base URL.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::new`].
    pub fn with_base_url(base_url: &str) -> Result<Self, ConfigError> {
        let base = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| ConfigError::Invalid(format!("invalid api_url {base_url}: {e}")))?;
        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .build()
            .map_err(|e| ConfigError::Invalid(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, base, jar })
    }

    /// A cookie mirror writing into this client's jar.
    pub fn cookie_mirror(&self) -> CookieMirror {
        CookieMirror::new(Arc::clone(&self.jar), self.base.clone())
    }

    /// Base URL requests are issued against.
    pub const fn base_url(&self) -> &Url {
        &self.base
    }

    /// Issue a request and return the raw JSON body.
    ///
    /// `path` is appended to the base URL verbatim and may carry a query
    /// string. The bearer header is attached only when `credential` is
    /// given.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] for any non-2xx response,
    /// [`ApiError::Transport`] if the request did not complete, and
    /// [`ApiError::Decode`] if a 2xx body is not JSON.
    pub async fn request(
        &self,
        path: &str,
        method: Method,
        body: Option<&serde_json::Value>,
        credential: Option<&str>,
    ) -> Result<serde_json::Value, ApiError> {
        let joined = format!("{}{path}", self.base.as_str().trim_end_matches('/'));
        let url = Url::parse(&joined).map_err(|e| ApiError::Transport {
            message: format!("invalid request url {joined}: {e}"),
        })?;
        self.send(method, url, body, credential).await
    }

    /// Build `{base}/seg/seg/...`, percent-encoding each segment.
    fn url_for(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::Transport {
                message: format!("api_url cannot be a base: {}", self.base),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<B, T>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        credential: Option<&str>,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut builder = self.http.request(method.clone(), url.clone());
        if let Some(token) = credential {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| ApiError::Transport {
            message: e.to_string(),
        })?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| ApiError::Transport {
            message: e.to_string(),
        })?;

        if !status.is_success() {
            let err = status_error(status.as_u16(), bytes.as_ref());
            debug!(%method, %url, status = status.as_u16(), code = err.code(), "request failed");
            return Err(err);
        }

        serde_json::from_slice(bytes.as_ref()).map_err(|e| ApiError::Decode {
            message: format!("{method} {}: {e}", url.path()),
        })
    }
}

impl AnimalApi for ApiClient {
    async fn list_animals(
        &self,
        creator: Option<&CreatorKey>,
        credential: Option<&str>,
    ) -> Result<AnimalList, ApiError> {
        let mut url = self.url_for(&["api", "animals"])?;
        if let Some(key) = creator {
            url.query_pairs_mut().append_pair("creator", key.as_str());
        }
        self.send::<(), _>(Method::GET, url, None, credential).await
    }

    async fn animal_detail(&self, id: &AnimalId) -> Result<AgentDetail, ApiError> {
        let url = self.url_for(&["api", "animals", id.as_str()])?;
        self.send::<(), _>(Method::GET, url, None, None).await
    }

    async fn timeline(&self, id: &AnimalId) -> Result<TimelineResponse, ApiError> {
        let url = self.url_for(&["api", "animals", id.as_str(), "timeline"])?;
        self.send::<(), _>(Method::GET, url, None, None).await
    }

    async fn feed(&self) -> Result<Feed, ApiError> {
        let url = self.url_for(&["api", "feed"])?;
        self.send::<(), _>(Method::GET, url, None, None).await
    }

    async fn birth(
        &self,
        request: &BirthRequest,
        credential: Option<&str>,
    ) -> Result<BirthReceipt, ApiError> {
        let url = self.url_for(&["api", "animals", "birth"])?;
        self.send(Method::POST, url, Some(request), credential).await
    }

    async fn public_config(&self) -> Result<PublicConfig, ApiError> {
        let url = self.url_for(&["api", "config"])?;
        self.send::<(), _>(Method::GET, url, None, None).await
    }

    async fn who_am_i(&self, credential: &str) -> Result<WhoAmI, ApiError> {
        let url = self.url_for(&["api", "auth", "me"])?;
        self.send::<(), _>(Method::GET, url, None, Some(credential))
            .await
    }

    async fn exchange_credential(&self, assertion: &GoogleCredential) -> Result<AuthGrant, ApiError> {
        let url = self.url_for(&["api", "auth", "google"])?;
        self.send(Method::POST, url, Some(assertion), None).await
    }
}

/// Turn a non-2xx response into an [`ApiError::Status`].
///
/// The body is parsed as an [`ErrorEnvelope`]; an absent or unparsable body
/// yields [`GENERIC_ERROR_CODE`] and no message.
pub fn status_error(status: u16, body: &[u8]) -> ApiError {
    let envelope: ErrorEnvelope = serde_json::from_slice(body).unwrap_or_default();
    let code = envelope
        .error
        .filter(|code| !code.trim().is_empty())
        .unwrap_or_else(|| GENERIC_ERROR_CODE.to_owned());
    ApiError::Status {
        status,
        code,
        message: envelope.message.filter(|m| !m.trim().is_empty()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn envelope_code_and_message_are_kept() {
        let err = status_error(400, br#"{"error":"invalid_body","message":"Body must be JSON."}"#);
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.code(), "invalid_body");
        assert_eq!(err.user_message(), "Body must be JSON.");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn missing_or_garbled_body_is_generic() {
        let bodies: [&[u8]; 4] = [b"", b"<html>502</html>", b"[]", br#"{"error":""}"#];
        for body in bodies {
            let err = status_error(502, body);
            assert_eq!(err.code(), GENERIC_ERROR_CODE);
            assert_eq!(err.kind(), ErrorKind::Server);
        }
    }

    #[test]
    fn unauthorized_is_auth_failure() {
        let err = status_error(401, br#"{"error":"unauthorized"}"#);
        assert!(err.is_auth_failure());
        assert_eq!(err.user_message(), "unauthorized");
    }

    #[test]
    fn segments_are_encoded() {
        let client = ApiClient::with_base_url("http://127.0.0.1:8000/").unwrap();
        let url = client
            .url_for(&["api", "animals", "a b/c", "timeline"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8000/api/animals/a%20b%2Fc/timeline"
        );
    }

    #[test]
    fn bad_base_url_is_config_error() {
        assert!(matches!(
            ApiClient::with_base_url("::nope"),
            Err(ConfigError::Invalid(_))
        ));
    }
}
