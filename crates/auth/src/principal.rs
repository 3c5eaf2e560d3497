use serde::{Deserialize, Serialize};

use crate::Permission;

/// Caller identity as reported by the identity provider's user-info endpoint.
///
/// Only the fields below are read from the provider payload; anything else
/// in the response is ignored. Missing fields default to empty / `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(default, alias = "Username")]
    pub username: String,

    #[serde(default, alias = "Email")]
    pub email: String,

    /// Subject identifier (`sub`), the key used for permission lookups.
    #[serde(default, rename = "sub")]
    pub subject_id: String,

    #[serde(default, rename = "email_verified")]
    pub email_verified: bool,
}

impl Identity {
    /// Decode a user-info payload.
    pub fn from_slice(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }
}

/// The resolved caller for one request: verified identity plus every
/// permission granted to it.
///
/// Built fresh by the pipeline for each request and owned by that request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub identity: Identity,
    pub permissions: Vec<Permission>,
}

impl Principal {
    pub fn new(identity: Identity, permissions: Vec<Permission>) -> Self {
        Self {
            identity,
            permissions,
        }
    }

    pub fn subject_id(&self) -> &str {
        &self.identity.subject_id
    }

    pub fn email(&self) -> &str {
        &self.identity.email
    }
}
