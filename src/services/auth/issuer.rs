use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::Serialize;
use tracing::error;
use uuid::Uuid;

use crate::config::GatewayConfig;
use crate::error::AppError;
use crate::services::auth::principal::CredentialClaims;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedCredential {
    pub token: String,
    pub expires_at: i64,
}

/// Signs credentials with the first allowed algorithm and the shared secret.
#[derive(Clone)]
pub struct CredentialIssuer {
    encoding_key: EncodingKey,
    algorithm: Algorithm,
    ttl_seconds: u64,
}

impl std::fmt::Debug for CredentialIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialIssuer")
            .field("algorithm", &self.algorithm)
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}

impl CredentialIssuer {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            algorithm: config.algorithms[0],
            ttl_seconds: config.token_ttl_seconds,
        }
    }

    pub fn issue(&self, subject_id: Uuid, is_admin: bool) -> Result<IssuedCredential, AppError> {
        self.issue_at(subject_id, is_admin, chrono::Utc::now().timestamp())
    }

    pub fn issue_at(
        &self,
        subject_id: Uuid,
        is_admin: bool,
        now: i64,
    ) -> Result<IssuedCredential, AppError> {
        let expires_at = i64::try_from(self.ttl_seconds)
            .ok()
            .and_then(|ttl| now.checked_add(ttl))
            .ok_or_else(|| {
                AppError::internal(format!("credential ttl {}s is out of range", self.ttl_seconds))
            })?;
        let claims = CredentialClaims {
            user_id: subject_id.to_string(),
            is_admin,
            iat: Some(now),
            exp: expires_at,
        };

        let mut header = Header::new(self.algorithm);
        header.typ = Some("JWT".to_string());
        let token = jsonwebtoken::encode(&header, &claims, &self.encoding_key).map_err(|e| {
            error!(error = %e, "failed to sign credential");
            AppError::internal("failed to sign credential")
        })?;

        Ok(IssuedCredential { token, expires_at })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::credential::CredentialValidator;
    use crate::services::auth::testing::{NOW, gateway_config};

    #[test]
    fn expiry_is_issue_time_plus_ttl() {
        let issued = CredentialIssuer::new(&gateway_config())
            .issue_at(Uuid::new_v4(), true, NOW)
            .unwrap();
        assert_eq!(issued.expires_at, NOW + 86_400);
    }

    #[test]
    fn out_of_range_ttl_is_refused_not_wrapped() {
        let mut config = gateway_config();
        config.token_ttl_seconds = u64::MAX;
        let err = CredentialIssuer::new(&config)
            .issue_at(Uuid::new_v4(), false, NOW)
            .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));

        config.token_ttl_seconds = i64::MAX as u64;
        assert!(CredentialIssuer::new(&config).issue_at(Uuid::new_v4(), false, NOW).is_err());
    }

    #[test]
    fn largest_accepted_ttl_still_validates() {
        let mut config = gateway_config();
        config.token_ttl_seconds = crate::config::MAX_TOKEN_TTL_SECONDS;
        let issued = CredentialIssuer::new(&config)
            .issue_at(Uuid::new_v4(), false, NOW)
            .unwrap();
        assert!(CredentialValidator::new(&config).validate_at(&issued.token, NOW + 1).is_ok());
    }
}
