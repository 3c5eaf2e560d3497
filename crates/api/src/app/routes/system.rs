use axum::{Extension, http::StatusCode};

use crate::context::PrincipalContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Echo the authenticated caller's email.
pub async fn whoami(Extension(principal): Extension<PrincipalContext>) -> (StatusCode, String) {
    (StatusCode::OK, principal.identity().email.clone())
}
