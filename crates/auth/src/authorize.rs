use thiserror::Error;

use crate::Principal;
use crate::policy::{self, Decision, DecisionReason, PathExtractionError};

/// Why a strategy refused a request.
///
/// These descriptions are for server-side logs; callers only ever see the
/// uniform "denied by policy" message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("no match in policy for '{path}'")]
    NoMatch { path: String },

    #[error("denied by policy: '{pattern}' matched '{path}'")]
    Denied { path: String, pattern: String },

    #[error("denied by policy: invalid deny pattern '{pattern}' ({error})")]
    InvalidDenyPattern { pattern: String, error: String },

    #[error(transparent)]
    Path(#[from] PathExtractionError),

    #[error("denied: {0}")]
    Other(String),
}

/// Authorization decision plugged into the authentication pipeline.
///
/// Implementations are selected per route when the router is built; the
/// pipeline only sees this trait.
pub trait AuthorizationStrategy: Send + Sync {
    /// Decide whether `principal` may access `request_target` (the raw request
    /// target: path plus optional query).
    fn decide(&self, principal: &Principal, request_target: &str) -> Result<(), AuthzError>;
}

/// Authentication is enough; no fine-grained policy is checked.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AuthorizationStrategy for AllowAll {
    fn decide(&self, _principal: &Principal, _request_target: &str) -> Result<(), AuthzError> {
        Ok(())
    }
}

/// Evaluate the principal's permissions against the request path, after
/// stripping the API prefix.
#[derive(Debug, Clone)]
pub struct PolicyBased {
    api_prefix: String,
}

impl PolicyBased {
    pub fn new(api_prefix: impl Into<String>) -> Self {
        Self {
            api_prefix: api_prefix.into(),
        }
    }

    pub fn api_prefix(&self) -> &str {
        &self.api_prefix
    }
}

impl AuthorizationStrategy for PolicyBased {
    fn decide(&self, principal: &Principal, request_target: &str) -> Result<(), AuthzError> {
        let path = policy::normalize_path(request_target, &self.api_prefix)?;
        let evaluation = policy::explain(&principal.permissions, path);

        tracing::debug!(
            subject = %principal.subject_id(),
            path = %evaluation.path,
            decision = ?evaluation.decision,
            reason = ?evaluation.reason,
            "policy evaluated"
        );

        match (evaluation.decision, evaluation.reason) {
            (Decision::Allow, _) => Ok(()),
            (Decision::Deny, DecisionReason::DenyMatched { pattern }) => Err(AuthzError::Denied {
                path: evaluation.path,
                pattern,
            }),
            (Decision::Deny, DecisionReason::InvalidDenyPattern { pattern, error }) => {
                Err(AuthzError::InvalidDenyPattern { pattern, error })
            }
            (Decision::Deny, _) => Err(AuthzError::NoMatch {
                path: evaluation.path,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Identity, Permission, Statement};

    fn principal(permissions: Vec<Permission>) -> Principal {
        Principal::new(
            Identity {
                subject_id: "user-1".to_string(),
                email_verified: true,
                ..Identity::default()
            },
            permissions,
        )
    }

    #[test]
    fn allow_all_never_rejects() {
        let p = principal(vec![
            Permission::denying(["ping"]),
            Permission::denying([".*"]),
        ]);
        assert_eq!(AllowAll.decide(&p, "/api/ping?foo=bar"), Ok(()));
        assert_eq!(AllowAll.decide(&p, ""), Ok(()));
        assert_eq!(AllowAll.decide(&principal(Vec::new()), "/anything"), Ok(()));
    }

    #[test]
    fn policy_allows_prefixed_target_with_query() {
        let p = principal(vec![Permission::allowing(["^/ping$"])]);
        let strategy = PolicyBased::new("/api");
        assert_eq!(strategy.decide(&p, "/api/ping?x=1"), Ok(()));
    }

    #[test]
    fn policy_reports_matching_deny() {
        let p = principal(vec![Permission::new(
            vec![Statement::for_actions(["^/pong$"])],
            vec![Statement::for_actions(["^/ping$", "^/pong$"])],
        )]);
        let err = PolicyBased::new("/api").decide(&p, "/api/pong?foo=bar").unwrap_err();
        assert_eq!(
            err,
            AuthzError::Denied {
                path: "/pong".to_string(),
                pattern: "^/pong$".to_string(),
            }
        );
    }

    #[test]
    fn policy_reports_no_match() {
        let p = principal(vec![Permission::allowing(["^/ping$"])]);
        let err = PolicyBased::new("/api").decide(&p, "/api/pang").unwrap_err();
        assert!(matches!(err, AuthzError::NoMatch { .. }));
    }

    #[test]
    fn policy_rejects_unparsable_target() {
        let p = principal(vec![Permission::allowing(["^/ping$", "/pong"])]);
        let err = PolicyBased::new("/api").decide(&p, "").unwrap_err();
        assert!(matches!(err, AuthzError::Path(_)));
    }

    #[test]
    fn policy_rejects_on_invalid_deny_pattern() {
        let p = principal(vec![Permission::new(
            vec![Statement::for_actions(["(unclosed"])],
            vec![Statement::for_actions([".*"])],
        )]);
        let err = PolicyBased::new("/api").decide(&p, "/api/ping").unwrap_err();
        assert!(matches!(err, AuthzError::InvalidDenyPattern { .. }));
    }

    #[test]
    fn strategies_are_usable_as_trait_objects() {
        let strategies: Vec<Box<dyn AuthorizationStrategy>> =
            vec![Box::new(AllowAll), Box::new(PolicyBased::new("/api"))];
        let p = principal(Vec::new());
        let outcomes: Vec<bool> = strategies
            .iter()
            .map(|s| s.decide(&p, "/api/ping").is_ok())
            .collect();
        assert_eq!(outcomes, vec![true, false]);
    }
}
