/// Factory: build the gateway and its collaborators from application `Config`.
use std::{sync::Arc, time::Duration};

use crate::config::{Config, GatewayConfig, RevocationMode};
use crate::services::auth::{
    CredentialIssuer, Gateway,
    revocation::{LegacyAdminOnly, NeverRevoked, RevocationPolicy, SubjectDenylist},
};
use crate::services::cache::{CacheError, ValkeyClient};

const REVOCATION_KEY_PREFIX: &str = "auth:revoked";

pub struct AuthComponents {
    pub gateway: Arc<Gateway>,
    pub issuer: Arc<CredentialIssuer>,
    pub revocation: Arc<dyn RevocationPolicy>,
}

pub async fn build_auth(config: &Config) -> Result<AuthComponents, CacheError> {
    let gateway_config = Arc::new(GatewayConfig::from_config(config));
    let revocation = build_revocation_policy(config, &gateway_config).await?;

    tracing::info!(
        revocation = revocation.name(),
        exemptions = gateway_config.exemptions.len(),
        algorithms = ?gateway_config.algorithms,
        "auth gateway configured"
    );
    if matches!(config.revocation_mode, RevocationMode::LegacyAdminOnly) {
        tracing::warn!("legacy-admin-only revocation: every non-admin credential is refused");
    }
    if gateway_config.exemptions.is_empty() {
        tracing::warn!("exemption table is empty: every route requires a credential");
    }

    Ok(AuthComponents {
        gateway: Arc::new(Gateway::new(gateway_config.clone(), revocation.clone())),
        issuer: Arc::new(CredentialIssuer::new(&gateway_config)),
        revocation,
    })
}

async fn build_revocation_policy(
    config: &Config,
    gateway_config: &GatewayConfig,
) -> Result<Arc<dyn RevocationPolicy>, CacheError> {
    let policy: Arc<dyn RevocationPolicy> = match &config.revocation_mode {
        RevocationMode::Disabled => Arc::new(NeverRevoked),
        RevocationMode::LegacyAdminOnly => Arc::new(LegacyAdminOnly),
        RevocationMode::SubjectDenylist { valkey_url } => {
            let client = ValkeyClient::new(valkey_url).await?;
            // A marker must outlive every credential it could apply to.
            let marker_ttl = Duration::from_secs(
                gateway_config
                    .token_ttl_seconds
                    .saturating_add(gateway_config.leeway_seconds),
            );
            Arc::new(SubjectDenylist::new(
                Arc::new(client),
                REVOCATION_KEY_PREFIX,
                marker_ttl,
            ))
        }
    };

    Ok(policy)
}
