//! Permission store boundary and the store-backed [`PermissionLoader`].
//!
//! The store holds three tables: per-user policy grants, policy groups, and
//! access policy documents. The loader turns an identity into the flat list of
//! permissions the policy engine evaluates.

pub mod in_memory;
pub mod r#trait;

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use pathguard_auth::{Identity, LoadError, Permission, PermissionLoader};

pub use in_memory::{InMemoryPolicyStore, PolicyStoreDocument};
pub use r#trait::{AccessPolicy, PolicyGroup, PolicyStore, PolicyStoreError, UserPolicyNames};

/// Loads permissions for an identity from a [`PolicyStore`]:
///
/// 1. reject an empty subject id
/// 2. read the user's direct policy names and group names
/// 3. expand groups into policy names
/// 4. deduplicate (first occurrence wins)
/// 5. batch-fetch the policy documents
///
/// A user without a record, or whose policies no longer exist, gets an empty
/// permission list.
pub struct StorePermissionLoader<S> {
    store: Arc<S>,
}

impl<S> StorePermissionLoader<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

impl<S> Clone for StorePermissionLoader<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: PolicyStore> StorePermissionLoader<S> {
    /// Every policy name granted to `user_id`, directly or through a group.
    pub async fn policy_names(&self, user_id: &str) -> Result<Vec<String>, PolicyStoreError> {
        let Some(user) = self.store.user_policy_names(user_id).await? else {
            return Ok(Vec::new());
        };

        let mut names = user.access_policies;
        if !user.policy_groups.is_empty() {
            let groups = self.store.batch_get_policy_groups(&user.policy_groups).await?;
            names.extend(groups.into_iter().flat_map(|g| g.policy_names));
        }

        Ok(dedup(names))
    }
}

fn dedup(names: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(names.len());
    names
        .into_iter()
        .filter(|n| seen.insert(n.clone()))
        .collect()
}

fn to_load_error(err: PolicyStoreError) -> LoadError {
    match err {
        PolicyStoreError::Decode(msg) => LoadError::Decode(msg),
        other => LoadError::Store(other.to_string()),
    }
}

#[async_trait]
impl<S: PolicyStore + 'static> PermissionLoader for StorePermissionLoader<S> {
    async fn load(&self, identity: &Identity) -> Result<Vec<Permission>, LoadError> {
        if identity.subject_id.is_empty() {
            return Err(LoadError::EmptySubject);
        }

        let names = self
            .policy_names(&identity.subject_id)
            .await
            .map_err(to_load_error)?;
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let policies = self
            .store
            .batch_get_access_policies(&names)
            .await
            .map_err(to_load_error)?;

        tracing::debug!(
            subject = %identity.subject_id,
            granted = names.len(),
            found = policies.len(),
            "permissions loaded"
        );

        Ok(policies.into_iter().map(|p| p.permissions).collect())
    }
}
