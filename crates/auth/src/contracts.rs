//! Collaborator contracts consumed by the authentication pipeline.
//!
//! Both collaborators are remote services (an identity provider and a
//! permission store). Timeouts and cancellation are their concern; the
//! pipeline only sees success or failure.

use async_trait::async_trait;
use thiserror::Error;

use crate::{Identity, Permission};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("identity provider unreachable: {0}")]
    Transport(String),

    #[error("identity provider responded with status {status}")]
    Status { status: u16 },

    #[error("failed to read identity provider response: {0}")]
    Body(String),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("subject id is empty")]
    EmptySubject,

    #[error("permission store error: {0}")]
    Store(String),

    #[error("failed to decode permission record: {0}")]
    Decode(String),
}

/// Credential → raw identity payload.
///
/// The returned bytes must decode into [`Identity`]; decoding is done by the
/// pipeline.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, bearer_token: &str) -> Result<Vec<u8>, ResolveError>;
}

/// Identity → every permission granted to it.
///
/// Implementations return an empty vector (not an error) when nothing is
/// granted.
#[async_trait]
pub trait PermissionLoader: Send + Sync {
    async fn load(&self, identity: &Identity) -> Result<Vec<Permission>, LoadError>;
}
