//! Authentication pipeline: bearer credential → [`Principal`], or one
//! classified rejection.
//!
//! Steps run in a fixed order and the first failure ends the request:
//!
//! 1. parse the `Authorization` header
//! 2. resolve the token into an [`Identity`]
//! 3. load the identity's permissions
//! 4. require a verified email
//! 5. ask the route's [`AuthorizationStrategy`]
//!
//! The pipeline is transport-agnostic; the HTTP layer maps [`RejectionKind`]
//! to a status code and client message.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::{AuthorizationStrategy, Identity, IdentityResolver, PermissionLoader, Principal};

pub const BEARER_SCHEME: &str = "Bearer";

/// Pipeline state reached before a rejection (or `Authorized` on success).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Start,
    HeaderParsed,
    IdentityResolved,
    PermissionsLoaded,
    VerificationChecked,
    Authorized,
}

impl core::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            PipelineStage::Start => "start",
            PipelineStage::HeaderParsed => "header_parsed",
            PipelineStage::IdentityResolved => "identity_resolved",
            PipelineStage::PermissionsLoaded => "permissions_loaded",
            PipelineStage::VerificationChecked => "verification_checked",
            PipelineStage::Authorized => "authorized",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    /// Malformed `Authorization` header.
    BadRequest,
    /// A collaborator (identity provider, permission store) failed.
    InternalError,
    /// Email not verified.
    EmailNotVerified,
    /// The authorization strategy refused the request.
    DeniedByPolicy,
}

/// Terminal outcome of a failed pipeline run.
///
/// `detail` carries the full underlying error for server-side logging and is
/// never sent to the caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind:?} at {stage}: {detail}")]
pub struct Rejection {
    pub kind: RejectionKind,
    pub stage: PipelineStage,
    pub detail: String,
}

impl Rejection {
    fn new(kind: RejectionKind, stage: PipelineStage, detail: impl Into<String>) -> Self {
        Self {
            kind,
            stage,
            detail: detail.into(),
        }
    }
}

/// Extract the token from a `Bearer <token>` header value.
///
/// The value must split on a single space into exactly two parts: the scheme
/// `Bearer` and a non-empty token without whitespace.
pub fn parse_bearer(header: Option<&str>) -> Option<&str> {
    let (scheme, token) = header?.split_once(' ')?;
    if scheme != BEARER_SCHEME || token.is_empty() || token.contains(char::is_whitespace) {
        return None;
    }
    Some(token)
}

#[derive(Clone)]
pub struct AuthenticationPipeline {
    resolver: Arc<dyn IdentityResolver>,
    loader: Arc<dyn PermissionLoader>,
    strategy: Arc<dyn AuthorizationStrategy>,
}

impl AuthenticationPipeline {
    pub fn new(
        resolver: Arc<dyn IdentityResolver>,
        loader: Arc<dyn PermissionLoader>,
        strategy: Arc<dyn AuthorizationStrategy>,
    ) -> Self {
        Self {
            resolver,
            loader,
            strategy,
        }
    }

    /// Same collaborators, different strategy (one pipeline per route).
    pub fn with_strategy(&self, strategy: Arc<dyn AuthorizationStrategy>) -> Self {
        Self {
            resolver: self.resolver.clone(),
            loader: self.loader.clone(),
            strategy,
        }
    }

    /// Run the pipeline for one request.
    ///
    /// `authorization` is the raw `Authorization` header value (`None` when the
    /// header is absent or not valid text); `request_target` is the raw target
    /// (path plus optional query) handed to the strategy.
    pub async fn authenticate(
        &self,
        authorization: Option<&str>,
        request_target: &str,
    ) -> Result<Principal, Rejection> {
        let token = parse_bearer(authorization).ok_or_else(|| {
            Rejection::new(
                RejectionKind::BadRequest,
                PipelineStage::Start,
                "malformed authorization header or token",
            )
        })?;

        let payload = self.resolver.resolve(token).await.map_err(|e| {
            Rejection::new(
                RejectionKind::InternalError,
                PipelineStage::HeaderParsed,
                format!("identity resolution error: {e}"),
            )
        })?;
        let identity = Identity::from_slice(&payload).map_err(|e| {
            Rejection::new(
                RejectionKind::InternalError,
                PipelineStage::HeaderParsed,
                format!("identity resolution error: undecodable user info: {e}"),
            )
        })?;

        let permissions = self.loader.load(&identity).await.map_err(|e| {
            Rejection::new(
                RejectionKind::InternalError,
                PipelineStage::IdentityResolved,
                format!("identity resolution error: permission loading failed: {e}"),
            )
        })?;

        if !identity.email_verified {
            return Err(Rejection::new(
                RejectionKind::EmailNotVerified,
                PipelineStage::PermissionsLoaded,
                format!("email not verified for subject '{}'", identity.subject_id),
            ));
        }

        let principal = Principal::new(identity, permissions);

        self.strategy
            .decide(&principal, request_target)
            .map_err(|e| {
                Rejection::new(
                    RejectionKind::DeniedByPolicy,
                    PipelineStage::VerificationChecked,
                    e.to_string(),
                )
            })?;

        Ok(principal)
    }
}
