use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use pathguard_auth::Permission;

/// Policy names attached to a user, keyed by the identity's subject id.
///
/// `access_policies` are granted directly; `policy_groups` name groups whose
/// policies are granted as well.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPolicyNames {
    pub user_id: String,

    #[serde(default)]
    pub access_policies: Vec<String>,

    #[serde(default)]
    pub policy_groups: Vec<String>,
}

/// A named bundle of access policies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyGroup {
    pub name: String,

    #[serde(default)]
    pub policy_names: Vec<String>,
}

/// An access policy document: the permission it grants plus metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPolicy {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono::serde::ts_seconds")]
    pub updated_at: DateTime<Utc>,

    pub permissions: Permission,
}

#[derive(Debug, Error)]
pub enum PolicyStoreError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("failed to decode record: {0}")]
    Decode(String),

    #[error("failed to read store file: {0}")]
    Io(#[from] std::io::Error),
}

/// Read-side lookups against the permission store.
///
/// Batch lookups return only the records that exist; unknown names are
/// skipped, not reported.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    async fn user_policy_names(&self, user_id: &str)
    -> Result<Option<UserPolicyNames>, PolicyStoreError>;

    async fn batch_get_policy_groups(
        &self,
        names: &[String],
    ) -> Result<Vec<PolicyGroup>, PolicyStoreError>;

    async fn batch_get_access_policies(
        &self,
        names: &[String],
    ) -> Result<Vec<AccessPolicy>, PolicyStoreError>;
}
