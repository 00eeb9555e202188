/*
 * Responsibility
 * - 検証済み credential の claims を表す型 (Principal)
 * - middleware が request extensions に格納し、handler は extractor 経由で受け取る
 */
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::auth::AuthError;

/// Claims carried by a credential.
///
/// Unknown claims are ignored on decode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialClaims {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "isAdmin", default)]
    pub is_admin: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    pub exp: i64,
}

/// Request-scoped identity built from a verified credential.
///
/// Only `CredentialValidator` constructs this, after signature and expiry checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    subject_id: Uuid,
    is_admin: bool,
    issued_at: Option<i64>,
    expires_at: i64,
}

impl Principal {
    pub(crate) fn from_verified_claims(claims: CredentialClaims) -> Result<Self, AuthError> {
        // Project convention: subject is a UUID
        let subject_id =
            Uuid::parse_str(claims.user_id.trim()).map_err(|_| AuthError::MalformedToken)?;

        Ok(Self {
            subject_id,
            is_admin: claims.is_admin,
            issued_at: claims.iat,
            expires_at: claims.exp,
        })
    }

    pub fn subject_id(&self) -> Uuid {
        self.subject_id
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    pub fn issued_at(&self) -> Option<i64> {
        self.issued_at
    }

    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }
}
