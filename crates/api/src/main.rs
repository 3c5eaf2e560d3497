use std::sync::Arc;

use anyhow::Context;

use pathguard_api::config::ApiConfig;
use pathguard_infra::{InMemoryPolicyStore, OAuthUserInfoResolver, StorePermissionLoader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::from_env().context("invalid configuration")?;
    pathguard_observability::init(config.log_format);

    let store = match &config.policy_store_path {
        Some(path) => InMemoryPolicyStore::from_json_file(path)
            .with_context(|| format!("failed to load policy store from {}", path.display()))?,
        None => {
            tracing::warn!("POLICY_STORE_PATH not set; policy-checked routes will deny every caller");
            InMemoryPolicyStore::new()
        }
    };

    let resolver = OAuthUserInfoResolver::new(&config.userinfo_endpoint, config.userinfo_timeout)
        .context("failed to build user-info client")?;
    let loader = StorePermissionLoader::new(Arc::new(store));

    let app = pathguard_api::app::build_app(&config.api_prefix, Arc::new(resolver), Arc::new(loader));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        api_prefix = %config.api_prefix,
        "listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
