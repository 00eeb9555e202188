/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - db: PgPool, gateway / issuer / revocation など
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::services::auth::{
    CredentialIssuer, Gateway, factory::AuthComponents, revocation::RevocationPolicy,
};

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub gateway: Arc<Gateway>,
    pub issuer: Arc<CredentialIssuer>,
    pub revocation: Arc<dyn RevocationPolicy>,
}

impl AppState {
    pub fn new(db: sqlx::PgPool, auth: AuthComponents) -> Self {
        Self {
            db,
            gateway: auth.gateway,
            issuer: auth.issuer,
            revocation: auth.revocation,
        }
    }
}
