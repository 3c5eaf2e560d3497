//! Infrastructure layer: identity provider client and permission store.

pub mod policy_store;
pub mod userinfo;

pub use policy_store::{InMemoryPolicyStore, PolicyStore, StorePermissionLoader};
pub use userinfo::OAuthUserInfoResolver;
