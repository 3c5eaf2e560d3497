use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use pathguard_auth::RejectionKind;

pub const MALFORMED_HEADER: &str = "Malformed authorization header or token";
pub const USER_ID_ERROR: &str = "UserID error";
pub const EMAIL_NOT_VERIFIED: &str = "Unauthorized - email not verified";
pub const DENIED_BY_POLICY: &str = "Unauthorized - denied by policy";

/// Status and client-facing message for a rejection.
///
/// Messages are fixed per classification; rejection details stay in the logs.
pub fn rejection_status(kind: RejectionKind) -> (StatusCode, &'static str) {
    match kind {
        RejectionKind::BadRequest => (StatusCode::BAD_REQUEST, MALFORMED_HEADER),
        RejectionKind::InternalError => (StatusCode::INTERNAL_SERVER_ERROR, USER_ID_ERROR),
        RejectionKind::EmailNotVerified => (StatusCode::UNAUTHORIZED, EMAIL_NOT_VERIFIED),
        RejectionKind::DeniedByPolicy => (StatusCode::UNAUTHORIZED, DENIED_BY_POLICY),
    }
}

pub fn rejection_response(kind: RejectionKind) -> Response {
    rejection_status(kind).into_response()
}
