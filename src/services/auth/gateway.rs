/*
 * Responsibility
 * - 1 リクエストごとの認証判定: exemption -> credential -> revocation
 * - HTTP 層 (axum) には依存しない。middleware がこの結果を extensions / response に変換する
 */
use std::sync::Arc;

use axum::http::{HeaderMap, Method, header};

use crate::config::GatewayConfig;
use crate::services::auth::{
    AuthError, credential::CredentialValidator, principal::Principal,
    revocation::RevocationPolicy,
};

/// Outcome of a request that may proceed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayDecision {
    /// Exempt request, forwarded without a principal.
    Bypassed,
    /// Verified and not revoked.
    Authorized(Principal),
}

pub struct Gateway {
    config: Arc<GatewayConfig>,
    validator: CredentialValidator,
    revocation: Arc<dyn RevocationPolicy>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("config", &self.config)
            .field("validator", &self.validator)
            .field("revocation", &self.revocation.name())
            .finish()
    }
}

impl Gateway {
    pub fn new(config: Arc<GatewayConfig>, revocation: Arc<dyn RevocationPolicy>) -> Self {
        let validator = CredentialValidator::new(&config);
        Self {
            config,
            validator,
            revocation,
        }
    }

    /// Run the stages in order. Exempt requests never look at the credential.
    pub async fn authorize(
        &self,
        method: &Method,
        path: &str,
        headers: &HeaderMap,
    ) -> Result<GatewayDecision, AuthError> {
        if self.config.exemptions.is_exempt(path, method.as_str()) {
            return Ok(GatewayDecision::Bypassed);
        }

        let token = bearer_token(headers)?;
        let principal = self.validator.validate(token)?;

        // The lookup is dropped with the request future if the client goes away.
        let revoked = tokio::time::timeout(
            self.config.revocation_timeout,
            self.revocation.is_revoked(&principal),
        )
        .await
        .map_err(|_| {
            tracing::warn!(
                policy = self.revocation.name(),
                timeout_ms = self.config.revocation_timeout.as_millis() as u64,
                "revocation lookup timed out"
            );
            AuthError::RevocationUnavailable
        })?
        .map_err(|err| {
            tracing::warn!(policy = self.revocation.name(), error = %err, "revocation lookup failed");
            AuthError::RevocationUnavailable
        })?;

        if revoked {
            return Err(AuthError::Revoked);
        }

        Ok(GatewayDecision::Authorized(principal))
    }
}

/// Extract `<token>` from `Authorization: Bearer <token>`. The scheme is case-insensitive.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredential)?
        .to_str()
        .map_err(|_| AuthError::MalformedToken)?;

    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or(AuthError::MalformedToken)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MalformedToken);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MalformedToken);
    }
    Ok(token)
}
