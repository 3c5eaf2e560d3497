//! Policy evaluation: allow/deny statement matching against a request path.
//!
//! - No IO
//! - No panics
//! - Deny is absolute: every deny statement of every permission is checked
//!   before an allow can take effect
//! - Default-deny: no matching allow means `Deny`

use serde::Serialize;
use thiserror::Error;

use crate::Permission;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("request path could not be extracted from '{target}'")]
pub struct PathExtractionError {
    pub target: String,
}

/// Final authorization decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Allow,
    Deny,
}

/// Why a decision was reached (for server-side logging only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecisionReason {
    AllowMatched { pattern: String },
    DenyMatched { pattern: String },
    InvalidDenyPattern { pattern: String, error: String },
    NoMatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub path: String,
    pub decision: Decision,
    pub reason: DecisionReason,
}

/// Normalize a raw request target into the path matched by policies.
///
/// Strips `prefix` when the target starts with it, drops any `?query` suffix
/// and surrounding whitespace. Applying it to an already normalized path (with
/// the same prefix absent) returns the path unchanged.
pub fn normalize_path<'a>(target: &'a str, prefix: &str) -> Result<&'a str, PathExtractionError> {
    let stripped = target.strip_prefix(prefix).unwrap_or(target);
    let path = stripped
        .split_once('?')
        .map_or(stripped, |(path, _query)| path)
        .trim();

    if path.is_empty() {
        return Err(PathExtractionError {
            target: target.to_string(),
        });
    }
    Ok(path)
}

/// Evaluate `permissions` against an already normalized `path`.
pub fn explain(permissions: &[Permission], path: &str) -> Evaluation {
    let mut allowed_by: Option<&str> = None;

    for permission in permissions {
        for statement in &permission.denys {
            for action in &statement.actions {
                match action.matches(path) {
                    Ok(false) => {}
                    Ok(true) => {
                        return Evaluation {
                            path: path.to_string(),
                            decision: Decision::Deny,
                            reason: DecisionReason::DenyMatched {
                                pattern: action.as_str().to_string(),
                            },
                        };
                    }
                    Err(err) => {
                        return Evaluation {
                            path: path.to_string(),
                            decision: Decision::Deny,
                            reason: DecisionReason::InvalidDenyPattern {
                                pattern: action.as_str().to_string(),
                                error: err.to_string(),
                            },
                        };
                    }
                }
            }
        }

        if allowed_by.is_none() {
            allowed_by = permission
                .allows
                .iter()
                .flat_map(|s| s.actions.iter())
                .find(|a| a.matches(path) == Ok(true))
                .map(|a| a.as_str());
        }
    }

    match allowed_by {
        Some(pattern) => Evaluation {
            path: path.to_string(),
            decision: Decision::Allow,
            reason: DecisionReason::AllowMatched {
                pattern: pattern.to_string(),
            },
        },
        None => Evaluation {
            path: path.to_string(),
            decision: Decision::Deny,
            reason: DecisionReason::NoMatch,
        },
    }
}

/// Normalize `target` (stripping `prefix`) and evaluate `permissions` against it.
pub fn evaluate(
    permissions: &[Permission],
    target: &str,
    prefix: &str,
) -> Result<Decision, PathExtractionError> {
    let path = normalize_path(target, prefix)?;
    Ok(explain(permissions, path).decision)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Statement;
    use proptest::prelude::*;

    /// Two permissions, each with an empty statement next to the real one.
    fn two_permissions(
        allow1: &[&str],
        allow2: &[&str],
        deny1: &[&str],
        deny2: &[&str],
    ) -> Vec<Permission> {
        vec![
            Permission::new(
                vec![Statement::default(), Statement::for_actions(deny1.iter().copied())],
                vec![Statement::for_actions(allow1.iter().copied()), Statement::default()],
            ),
            Permission::new(
                vec![Statement::for_actions(deny2.iter().copied()), Statement::default()],
                vec![Statement::default(), Statement::for_actions(allow2.iter().copied())],
            ),
        ]
    }

    #[test]
    fn normalize_strips_prefix_and_query() {
        assert_eq!(normalize_path("/api/ping?foo=bar", "/api"), Ok("/ping"));
        assert_eq!(normalize_path("/api/ping", "/api"), Ok("/ping"));
        assert_eq!(normalize_path("/ping", "/api"), Ok("/ping"));
        assert_eq!(normalize_path(" /ping ", ""), Ok("/ping"));
    }

    #[test]
    fn normalize_rejects_empty_targets() {
        assert!(normalize_path("", "/api").is_err());
        assert!(normalize_path("/api", "/api").is_err());
        assert!(normalize_path("/api?x=1", "/api").is_err());
        assert!(normalize_path("   ", "").is_err());
    }

    #[test]
    fn allow_in_first_permission() {
        let perms = two_permissions(&["^/ping$", "^/pong$"], &["^/pang$"], &["/pung"], &[]);
        assert_eq!(evaluate(&perms, "/api/ping?foo=bar", "/api"), Ok(Decision::Allow));
    }

    #[test]
    fn allow_in_second_permission() {
        let perms = two_permissions(&["^/pang$"], &["^/ping$", "^/pong$"], &[], &["/pung"]);
        assert_eq!(evaluate(&perms, "/api/ping?foo=bar", "/api"), Ok(Decision::Allow));
    }

    #[test]
    fn deny_overrides_allow_in_same_permission() {
        let perms = two_permissions(&["^/ping$", "^/pong$"], &[], &["^/pong$"], &[]);
        assert_eq!(evaluate(&perms, "/api/pong?foo=bar", "/api"), Ok(Decision::Deny));
    }

    #[test]
    fn deny_in_later_permission_overrides_earlier_allow() {
        let perms = vec![Permission::allowing(["^/ping$"]), Permission::denying(["^/ping$"])];
        let eval = explain(&perms, "/ping");
        assert_eq!(eval.decision, Decision::Deny);
        assert_eq!(
            eval.reason,
            DecisionReason::DenyMatched {
                pattern: "^/ping$".to_string()
            }
        );
    }

    #[test]
    fn no_match_is_default_deny() {
        let perms = two_permissions(&["x"], &["y"], &["1"], &["2"]);
        assert_eq!(evaluate(&perms, "/api/pang?foo=bar", "/api"), Ok(Decision::Deny));
        assert_eq!(explain(&perms, "/pang").reason, DecisionReason::NoMatch);
    }

    #[test]
    fn empty_statements_are_inert() {
        let perms = two_permissions(&[], &[], &[], &[]);
        assert_eq!(evaluate(&perms, "/api/pang?foo=bar", "/api"), Ok(Decision::Deny));
    }

    #[test]
    fn zero_permissions_deny() {
        assert_eq!(explain(&[], "/ping").decision, Decision::Deny);
    }

    #[test]
    fn unparsable_target_is_an_error_not_an_allow() {
        let perms = vec![Permission::allowing([".*"])];
        assert!(evaluate(&perms, "", "/api").is_err());
    }

    #[test]
    fn invalid_deny_pattern_fails_closed() {
        let perms = vec![Permission::allowing(["^/ping$"]), Permission::denying(["("])];
        let eval = explain(&perms, "/ping");
        assert_eq!(eval.decision, Decision::Deny);
        assert!(matches!(eval.reason, DecisionReason::InvalidDenyPattern { .. }));
    }

    #[test]
    fn invalid_allow_pattern_never_matches() {
        let perms = vec![Permission::allowing(["(", "^/pong$"])];
        assert_eq!(explain(&perms, "/ping").decision, Decision::Deny);
        assert_eq!(explain(&perms, "/pong").decision, Decision::Allow);
    }

    #[test]
    fn resources_are_not_evaluated() {
        let perms = vec![Permission::new(
            Vec::new(),
            vec![Statement::new(["^/ping$"], ["^/nothing-matches-this$"])],
        )];
        assert_eq!(explain(&perms, "/ping").decision, Decision::Allow);
    }

    fn segment() -> impl Strategy<Value = String> {
        "[a-z]{1,6}"
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: normalizing an already normalized path is a no-op.
        #[test]
        fn normalization_is_idempotent(
            segments in prop::collection::vec(segment(), 1..5),
            query in prop::option::of("[a-z]{1,4}=[0-9]{1,3}"),
        ) {
            let mut target = format!("/v1/{}", segments.join("/"));
            if let Some(q) = query {
                target.push('?');
                target.push_str(&q);
            }

            let once = normalize_path(&target, "/v1").unwrap();
            let twice = normalize_path(once, "/v1").unwrap();
            prop_assert_eq!(once, twice);
        }

        /// Property: a matching deny anywhere wins over any number of allows.
        #[test]
        fn any_matching_deny_denies(
            path in segment().prop_map(|s| format!("/{s}")),
            allow_count in 0usize..4,
            deny_at in 0usize..4,
        ) {
            let exact = format!("^{}$", regex::escape(&path));
            let mut perms: Vec<Permission> =
                (0..allow_count).map(|_| Permission::allowing([exact.as_str()])).collect();
            let at = deny_at.min(perms.len());
            perms.insert(at, Permission::denying([exact.as_str()]));

            prop_assert_eq!(explain(&perms, &path).decision, Decision::Deny);
        }

        /// Property: with no deny match, one matching allow is enough.
        #[test]
        fn allow_without_deny_allows(
            path in segment().prop_map(|s| format!("/{s}")),
            unrelated in prop::collection::vec(segment(), 0..4),
        ) {
            let mut perms: Vec<Permission> = unrelated
                .iter()
                .map(|s| Permission::denying([format!("^/{s}/never$")]))
                .collect();
            perms.push(Permission::allowing([format!("^{}$", regex::escape(&path))]));

            prop_assert_eq!(explain(&perms, &path).decision, Decision::Allow);
        }

        /// Property: when nothing matches, the decision is deny.
        #[test]
        fn nothing_matching_denies(
            path in segment().prop_map(|s| format!("/{s}")),
            patterns in prop::collection::vec(segment(), 0..4),
        ) {
            let perms: Vec<Permission> = patterns
                .iter()
                .map(|p| Permission::allowing([format!("^/{p}/x$")]))
                .collect();

            prop_assert_eq!(explain(&perms, &path).decision, Decision::Deny);
        }
    }
}
