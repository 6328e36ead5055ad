//! Request and response bodies for the non-listing endpoints.
//!
//! Covers birth, public configuration, authentication, and the error
//! envelope every non-2xx response may carry.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::{AnimalId, CreatorKey, UserId};

/// Body of `POST /api/animals/birth`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BirthRequest {
    /// The client's creator key, when it has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<CreatorKey>,
}

/// Response of a successful birth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BirthReceipt {
    /// The newborn's identifier.
    pub animal_id: AnimalId,
    /// Creator key the server recorded. May differ from the one sent.
    #[serde(default)]
    pub creator: Option<CreatorKey>,
    /// Profile locator.
    #[serde(default)]
    pub slug: Option<String>,
    /// Species.
    #[serde(default)]
    pub species: Option<String>,
}

impl BirthReceipt {
    /// Server-assigned creator key, treating `""` as absent.
    pub fn creator(&self) -> Option<&CreatorKey> {
        self.creator.as_ref().filter(|key| !key.is_empty())
    }
}

/// Body of `GET /api/config`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PublicConfig {
    /// OAuth client id of the external sign-in provider, if configured.
    #[serde(default)]
    pub google_client_id: Option<String>,
}

impl PublicConfig {
    /// The provider client id, treating blank values as unconfigured.
    pub fn provider_client_id(&self) -> Option<&str> {
        self.google_client_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Body of `GET /api/auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WhoAmI {
    /// The authenticated user.
    pub user_id: UserId,
    /// Display name.
    #[serde(default)]
    pub username: String,
}

/// Body of `POST /api/auth/google`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GoogleCredential {
    /// Opaque assertion returned by the identity provider widget.
    pub credential: String,
}

/// Response of a successful credential exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AuthGrant {
    /// Bearer credential issued by the server.
    pub token: String,
    /// The authenticated user.
    pub user_id: UserId,
    /// Display name.
    #[serde(default)]
    pub username: String,
}

/// Optional JSON body of a non-2xx response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ErrorEnvelope {
    /// Machine-readable code.
    #[serde(default)]
    pub error: Option<String>,
    /// Human-readable message.
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn birth_request_omits_absent_creator() {
        let body = serde_json::to_value(BirthRequest::default()).unwrap();
        assert_eq!(body, serde_json::json!({}));
        let body = serde_json::to_value(BirthRequest {
            creator_id: Some(CreatorKey::from("anon_abc")),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"creator_id": "anon_abc"}));
    }

    #[test]
    fn receipt_blank_creator_is_absent() {
        let receipt: BirthReceipt = serde_json::from_value(serde_json::json!({
            "animal_id": "a9",
            "creator": "",
            "species": "owl"
        }))
        .unwrap();
        assert!(receipt.creator().is_none());
    }

    #[test]
    fn blank_provider_id_is_unconfigured() {
        let config: PublicConfig =
            serde_json::from_value(serde_json::json!({"google_client_id": "  "})).unwrap();
        assert!(config.provider_client_id().is_none());
        let config: PublicConfig = serde_json::from_str("{}").unwrap();
        assert!(config.provider_client_id().is_none());
        let config: PublicConfig =
            serde_json::from_value(serde_json::json!({"google_client_id": "123.apps"})).unwrap();
        assert_eq!(config.provider_client_id(), Some("123.apps"));
    }

    #[test]
    fn envelope_tolerates_partial_bodies() {
        let env: ErrorEnvelope =
            serde_json::from_value(serde_json::json!({"error": "not_found"})).unwrap();
        assert_eq!(env.error.as_deref(), Some("not_found"));
        assert!(env.message.is_none());
    }
}
