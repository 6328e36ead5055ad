//! Type-safe identifier wrappers around opaque strings.
//!
//! The backend owns every identifier and the client never parses them, so
//! each is a transparent newtype over [`String`]. Distinct types keep an
//! animal id from being passed where a creator key is expected.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Generates a transparent newtype wrapper around [`String`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[serde(transparent)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub String);

        impl $name {
            /// Wrap an identifier string.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Return the inner [`String`].
            pub fn into_inner(self) -> String {
                self.0
            }

            /// Whether the identifier is the empty string.
            ///
            /// The backend uses `""` to mean "absent" in a few places.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Stable identifier of an animal (agent) in the simulation.
    AnimalId
}

define_id! {
    /// Key identifying who created an animal: an anonymous token or a user id.
    CreatorKey
}

define_id! {
    /// Identifier of an authenticated user account.
    UserId
}

impl From<UserId> for CreatorKey {
    fn from(id: UserId) -> Self {
        Self(id.0)
    }
}
