use axum::{
    extract::{OriginalUri, Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

use pathguard_auth::{AuthenticationPipeline, RejectionKind};

use crate::app::errors::rejection_response;
use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AuthState {
    pub pipeline: AuthenticationPipeline,
}

impl AuthState {
    pub fn new(pipeline: AuthenticationPipeline) -> Self {
        Self { pipeline }
    }
}

/// Run the authentication pipeline for the request; forward to the handler
/// with a [`PrincipalContext`] on success, or answer with the classified
/// rejection.
pub async fn require_authentication(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    let target = request_target(&req);
    let span = tracing::info_span!(
        "authenticate",
        request_id = %Uuid::now_v7(),
        method = %req.method(),
        target = %target,
    );

    async move {
        let authorization = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        let outcome = state.pipeline.authenticate(authorization, &target).await;
        match outcome {
            Ok(principal) => {
                tracing::debug!(subject = %principal.subject_id(), "request authorized");
                req.extensions_mut().insert(PrincipalContext::new(principal));
                next.run(req).await
            }
            Err(rejection) => {
                match rejection.kind {
                    RejectionKind::InternalError => tracing::error!(
                        stage = %rejection.stage,
                        kind = ?rejection.kind,
                        detail = %rejection.detail,
                        "request rejected"
                    ),
                    _ => tracing::warn!(
                        stage = %rejection.stage,
                        kind = ?rejection.kind,
                        detail = %rejection.detail,
                        "request rejected"
                    ),
                }
                rejection_response(rejection.kind)
            }
        }
    }
    .instrument(span)
    .await
}

/// Raw request target (path plus optional query) as sent by the client,
/// before any router nesting rewrote the URI.
fn request_target(req: &Request) -> String {
    let uri = req
        .extensions()
        .get::<OriginalUri>()
        .map(|o| &o.0)
        .unwrap_or_else(|| req.uri());
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_default()
}
