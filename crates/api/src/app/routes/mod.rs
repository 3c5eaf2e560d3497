use axum::{Router, middleware::from_fn_with_state, routing::get};

use crate::middleware::{AuthState, require_authentication};

pub mod system;

/// Router for the authenticated endpoints under `prefix`.
///
/// `/ping` only requires authentication; `/pong`, `/pung` and `/pang` are
/// checked against the caller's policies.
pub fn router(prefix: &str, allow_all: AuthState, policy: AuthState) -> Router {
    let authenticated = Router::new()
        .route(&format!("{prefix}/ping"), get(system::whoami))
        .route_layer(from_fn_with_state(allow_all, require_authentication));

    let policy_checked = Router::new()
        .route(&format!("{prefix}/pong"), get(system::whoami))
        .route(&format!("{prefix}/pung"), get(system::whoami))
        .route(&format!("{prefix}/pang"), get(system::whoami))
        .route_layer(from_fn_with_state(policy, require_authentication));

    authenticated.merge(policy_checked)
}
