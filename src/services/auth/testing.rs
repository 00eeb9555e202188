//! Shared fixtures for auth tests.
use std::time::Duration;

use jsonwebtoken::Algorithm;
use uuid::Uuid;

use crate::config::GatewayConfig;
use crate::services::auth::exemption::ExemptionRules;
use crate::services::auth::principal::{CredentialClaims, Principal};

pub const SECRET: &str = "test-secret-do-not-use";
pub const NOW: i64 = 1_700_000_000;

pub fn gateway_config() -> GatewayConfig {
    GatewayConfig {
        secret: SECRET.to_string(),
        algorithms: vec![Algorithm::HS256],
        leeway_seconds: 0,
        token_ttl_seconds: 86_400,
        exemptions: ExemptionRules::defaults("/api/v1"),
        revocation_timeout: Duration::from_millis(500),
    }
}

pub fn principal(is_admin: bool, issued_at: Option<i64>) -> Principal {
    Principal::from_verified_claims(CredentialClaims {
        user_id: Uuid::new_v4().to_string(),
        is_admin,
        iat: issued_at,
        exp: NOW + 3600,
    })
    .unwrap()
}
