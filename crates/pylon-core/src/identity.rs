//! Authenticated caller identity.

use serde::{Deserialize, Serialize};

/// The identity contributed to the request context by the auth stage.
///
/// Routes that require no authentication run with [`Identity::Anonymous`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Identity {
    /// No credentials were required or presented.
    Anonymous,

    /// An authenticated end user.
    User {
        /// Stable user identifier.
        user_id: String,
        /// Roles granted to the user.
        #[serde(default)]
        roles: Vec<String>,
    },

    /// A caller authenticated with an API key.
    ApiKey {
        /// Identifier of the key (never the key material itself).
        key_id: String,
    },

    /// An internal service caller.
    Service {
        /// The calling service's name.
        name: String,
    },
}

impl Identity {
    /// Returns `true` for [`Identity::Anonymous`].
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }

    /// Returns the user ID when this is a [`Identity::User`].
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::User { user_id, .. } => Some(user_id),
            _ => None,
        }
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::Anonymous
    }
}
