//! `pathguard-auth` — request authentication and path-policy authorization.
//!
//! This crate is intentionally decoupled from HTTP and storage: identity
//! providers and permission stores are reached through the contracts in
//! [`contracts`].

pub mod authorize;
pub mod contracts;
pub mod permissions;
pub mod pipeline;
pub mod policy;
pub mod principal;

pub use authorize::{AllowAll, AuthorizationStrategy, AuthzError, PolicyBased};
pub use contracts::{IdentityResolver, LoadError, PermissionLoader, ResolveError};
pub use permissions::{ActionPattern, Permission, Statement};
pub use pipeline::{AuthenticationPipeline, PipelineStage, Rejection, RejectionKind};
pub use policy::{Decision, DecisionReason, Evaluation, PathExtractionError};
pub use principal::{Identity, Principal};
