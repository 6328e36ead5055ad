//! Error types for the OpenAnimal client.
//!
//! [`ApiError`] is what every outbound request fails with. Its
//! [`ErrorKind`] maps a failure onto the handling policy the
//! synchronization loop applies: swallow transport failures, surface
//! validation failures inline, downgrade identity on authentication
//! failures, and clear a dangling selection on not-found.

/// Code used when a failed response carries no parsable error body.
pub const GENERIC_ERROR_CODE: &str = "request_failed";

/// Coarse classification of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request never completed (connection, DNS, TLS, body read).
    Transport,
    /// A 4xx other than authentication or not-found.
    Validation,
    /// HTTP 401: the credential is missing, expired, or invalid.
    Authentication,
    /// HTTP 404.
    NotFound,
    /// A 5xx, or a 2xx body that did not decode.
    Server,
}

/// Errors returned by the API client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request could not be sent or its response not read.
    #[error("transport error: {message}")]
    Transport {
        /// Description from the HTTP layer.
        message: String,
    },

    /// The server answered with a non-success status.
    #[error("HTTP {status}: {code}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Machine-readable code from the error envelope, or [`GENERIC_ERROR_CODE`].
        code: String,
        /// Human-readable message from the error envelope.
        message: Option<String>,
    },

    /// A success response did not match the expected shape.
    #[error("decode error: {message}")]
    Decode {
        /// Description of the mismatch.
        message: String,
    },
}

impl ApiError {
    /// HTTP status, when the server answered.
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport { .. } | Self::Decode { .. } => None,
        }
    }

    /// Machine-readable code.
    pub fn code(&self) -> &str {
        match self {
            Self::Status { code, .. } => code,
            Self::Transport { .. } => "transport_failed",
            Self::Decode { .. } => "decode_failed",
        }
    }

    /// Classify this failure.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Decode { .. } => ErrorKind::Server,
            Self::Status { status, .. } => match *status {
                401 => ErrorKind::Authentication,
                404 => ErrorKind::NotFound,
                400..=499 => ErrorKind::Validation,
                _ => ErrorKind::Server,
            },
        }
    }

    /// Whether the credential was rejected.
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self.kind(), ErrorKind::Authentication)
    }

    /// Whether the resource does not exist.
    pub const fn is_not_found(&self) -> bool {
        matches!(self.kind(), ErrorKind::NotFound)
    }

    /// Short text suitable for an inline message: the server's message if
    /// it sent one, otherwise the code.
    pub fn user_message(&self) -> &str {
        match self {
            Self::Status {
                message: Some(message),
                ..
            } if !message.is_empty() => message,
            _ => self.code(),
        }
    }
}

/// Errors from the durable key/value store.
///
/// These never escape [`BestEffortStore`](crate::storage::BestEffortStore).
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The backing file is not a JSON string map.
    #[error("storage format error: {source}")]
    Format {
        /// The underlying serde error.
        #[from]
        source: serde_json::Error,
    },

    /// Storage is switched off.
    #[error("storage unavailable")]
    Unavailable,
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value is present but unusable.
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Why a birth did not produce an animal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BirthError {
    /// Birth needs a signed-in identity and there is none; the sign-in
    /// prompt has been opened instead of issuing the request.
    #[error("sign in to birth an animal")]
    SignInRequired,

    /// A birth request is already in flight.
    #[error("a birth is already in progress")]
    InProgress,

    /// The server rejected the credential; local auth state was cleared.
    #[error("session expired, sign in again")]
    AuthenticationExpired,

    /// The server refused the request.
    #[error("{message}")]
    Rejected {
        /// Short message for the inline notice.
        message: String,
    },

    /// The request did not complete.
    #[error("birth failed: {message}")]
    Unavailable {
        /// Transport or server description.
        message: String,
    },
}

/// Why a sign-in attempt did not complete.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignInError {
    /// The server does not advertise an identity provider.
    #[error("sign-in is not configured on this server")]
    NotConfigured,

    /// An exchange is already pending or the visitor is already signed in.
    #[error("a sign-in is already in progress")]
    AlreadyInProgress,

    /// The server refused the assertion or could not be reached.
    #[error("{message}")]
    Rejected {
        /// Short message for the inline notice.
        message: String,
    },
}
