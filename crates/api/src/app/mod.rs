//! HTTP application wiring (Axum router).
//!
//! - `routes/`: HTTP routes + handlers
//! - `errors.rs`: rejection → response mapping

use std::sync::Arc;

use axum::{Router, routing::get};
use tower::ServiceBuilder;

use pathguard_auth::{
    AllowAll, AuthenticationPipeline, IdentityResolver, PermissionLoader, PolicyBased,
};

use crate::middleware::AuthState;

pub mod errors;
pub mod routes;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
///
/// Collaborators are injected so tests can stand in for the identity provider
/// and the permission store.
pub fn build_app(
    api_prefix: &str,
    resolver: Arc<dyn IdentityResolver>,
    loader: Arc<dyn PermissionLoader>,
) -> Router {
    let allow_all = AuthenticationPipeline::new(resolver, loader, Arc::new(AllowAll));
    let policy = allow_all.with_strategy(Arc::new(PolicyBased::new(api_prefix)));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router(
            api_prefix,
            AuthState::new(allow_all),
            AuthState::new(policy),
        ))
        .layer(ServiceBuilder::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use pathguard_auth::{Identity, LoadError, Permission, ResolveError};
    use tower::ServiceExt;

    struct VerifiedUser;

    #[async_trait]
    impl IdentityResolver for VerifiedUser {
        async fn resolve(&self, _bearer_token: &str) -> Result<Vec<u8>, ResolveError> {
            Ok(br#"{"sub":"u-1","email":"u1@example.com","email_verified":true}"#.to_vec())
        }
    }

    struct PingOnly;

    #[async_trait]
    impl PermissionLoader for PingOnly {
        async fn load(&self, _identity: &Identity) -> Result<Vec<Permission>, LoadError> {
            Ok(vec![Permission::allowing(["^/pong$"])])
        }
    }

    async fn send(app: Router, uri: &str, bearer: Option<&str>) -> (StatusCode, String) {
        let mut req = Request::builder().uri(uri);
        if let Some(token) = bearer {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let res = app.oneshot(req.body(Body::empty()).unwrap()).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn custom_prefix_is_routed_and_stripped() {
        let app = build_app("/v2", Arc::new(VerifiedUser), Arc::new(PingOnly));

        assert_eq!(
            send(app.clone(), "/v2/pong?page=1", Some("t")).await,
            (StatusCode::OK, "u1@example.com".to_string())
        );
        assert_eq!(
            send(app.clone(), "/v2/pang", Some("t")).await,
            (StatusCode::UNAUTHORIZED, "Unauthorized - denied by policy".to_string())
        );
        assert_eq!(send(app, "/api/pong", Some("t")).await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_routes_are_not_authenticated() {
        let app = build_app("/api", Arc::new(VerifiedUser), Arc::new(PingOnly));
        assert_eq!(send(app, "/api/elsewhere", None).await.0, StatusCode::NOT_FOUND);
    }
}
