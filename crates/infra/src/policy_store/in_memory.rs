use std::collections::HashMap;
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::r#trait::{AccessPolicy, PolicyGroup, PolicyStore, PolicyStoreError, UserPolicyNames};

/// Serialized form of a whole store (used to seed it from a JSON file).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyStoreDocument {
    #[serde(default)]
    pub user_access_policies: Vec<UserPolicyNames>,

    #[serde(default)]
    pub policy_groups: Vec<PolicyGroup>,

    #[serde(default)]
    pub access_policies: Vec<AccessPolicy>,
}

/// In-memory permission store.
///
/// Intended for tests/dev and small deployments seeded from a file. Action
/// patterns are compiled once, when records are inserted.
#[derive(Debug, Default)]
pub struct InMemoryPolicyStore {
    users: RwLock<HashMap<String, UserPolicyNames>>,
    groups: RwLock<HashMap<String, PolicyGroup>>,
    policies: RwLock<HashMap<String, AccessPolicy>>,
}

impl InMemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_document(doc: PolicyStoreDocument) -> Result<Self, PolicyStoreError> {
        let store = Self::new();
        for user in doc.user_access_policies {
            store.put_user(user)?;
        }
        for group in doc.policy_groups {
            store.put_group(group)?;
        }
        for policy in doc.access_policies {
            store.put_policy(policy)?;
        }
        Ok(store)
    }

    pub fn from_json_str(json: &str) -> Result<Self, PolicyStoreError> {
        let doc: PolicyStoreDocument =
            serde_json::from_str(json).map_err(|e| PolicyStoreError::Decode(e.to_string()))?;
        Self::from_document(doc)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PolicyStoreError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let store = Self::from_json_str(&content)?;
        tracing::info!(
            path = %path.display(),
            users = read(&store.users)?.len(),
            groups = read(&store.groups)?.len(),
            policies = read(&store.policies)?.len(),
            "policy store loaded"
        );
        Ok(store)
    }

    pub fn put_user(&self, user: UserPolicyNames) -> Result<(), PolicyStoreError> {
        self.users
            .write()
            .map_err(|_| poisoned("users"))?
            .insert(user.user_id.clone(), user);
        Ok(())
    }

    pub fn put_group(&self, group: PolicyGroup) -> Result<(), PolicyStoreError> {
        self.groups
            .write()
            .map_err(|_| poisoned("groups"))?
            .insert(group.name.clone(), group);
        Ok(())
    }

    pub fn put_policy(&self, policy: AccessPolicy) -> Result<(), PolicyStoreError> {
        for bad in policy.permissions.invalid_patterns() {
            tracing::warn!(
                policy = %policy.name,
                pattern = %bad,
                "access policy contains an invalid action pattern; it will deny when used as a deny and never match as an allow"
            );
        }
        self.policies
            .write()
            .map_err(|_| poisoned("policies"))?
            .insert(policy.name.clone(), policy);
        Ok(())
    }
}

fn poisoned(table: &str) -> PolicyStoreError {
    PolicyStoreError::Storage(format!("{table} table lock poisoned"))
}

fn read<T>(
    table: &RwLock<HashMap<String, T>>,
) -> Result<RwLockReadGuard<'_, HashMap<String, T>>, PolicyStoreError> {
    table.read().map_err(|_| poisoned("policy store"))
}

fn batch_get<T: Clone>(
    table: &RwLock<HashMap<String, T>>,
    names: &[String],
) -> Result<Vec<T>, PolicyStoreError> {
    let table = read(table)?;
    Ok(names.iter().filter_map(|n| table.get(n).cloned()).collect())
}

#[async_trait]
impl PolicyStore for InMemoryPolicyStore {
    async fn user_policy_names(
        &self,
        user_id: &str,
    ) -> Result<Option<UserPolicyNames>, PolicyStoreError> {
        Ok(read(&self.users)?.get(user_id).cloned())
    }

    async fn batch_get_policy_groups(
        &self,
        names: &[String],
    ) -> Result<Vec<PolicyGroup>, PolicyStoreError> {
        batch_get(&self.groups, names)
    }

    async fn batch_get_access_policies(
        &self,
        names: &[String],
    ) -> Result<Vec<AccessPolicy>, PolicyStoreError> {
        batch_get(&self.policies, names)
    }
}
