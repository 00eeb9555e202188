use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use uuid::Uuid;

use crate::services::auth::principal::Principal;
use crate::services::cache::{CacheClient, CacheError};

pub type RevocationFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, RevocationError>> + Send + 'a>>;

#[derive(Debug, thiserror::Error)]
pub enum RevocationError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("invalid revocation marker for {key}: {value:?}")]
    InvalidMarker { key: String, value: String },

    #[error("revocation policy '{0}' does not support this operation")]
    Unsupported(&'static str),
}

/// Decides whether an otherwise valid credential must be refused.
///
/// Result:
/// - `Ok(true)`: revoked
/// - `Ok(false)`: still valid
/// - `Err(_)`: source failure (the gateway treats it as revoked)
pub trait RevocationPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    fn is_revoked<'a>(&'a self, principal: &'a Principal) -> RevocationFuture<'a, bool>;

    /// Revoke every credential of `subject_id` issued at or before `at`.
    fn revoke_subject(&self, _subject_id: Uuid, _at: i64) -> RevocationFuture<'_, ()> {
        let name = self.name();
        Box::pin(async move { Err(RevocationError::Unsupported(name)) })
    }

    /// Lift a subject's revocation. Returns whether a marker existed.
    fn restore_subject(&self, _subject_id: Uuid) -> RevocationFuture<'_, bool> {
        let name = self.name();
        Box::pin(async move { Err(RevocationError::Unsupported(name)) })
    }
}

/// Legacy rule: only administrator credentials are ever accepted.
///
/// NOTE: this turns the service into admin-only access. It is kept for
/// deployments that must match the old behaviour bit for bit and is never the
/// default.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyAdminOnly;

impl RevocationPolicy for LegacyAdminOnly {
    fn name(&self) -> &'static str {
        "legacy-admin-only"
    }

    fn is_revoked<'a>(&'a self, principal: &'a Principal) -> RevocationFuture<'a, bool> {
        Box::pin(std::future::ready(Ok(!principal.is_admin())))
    }
}

/// No revocation source: valid credentials stay valid until they expire.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverRevoked;

impl RevocationPolicy for NeverRevoked {
    fn name(&self) -> &'static str {
        "none"
    }

    fn is_revoked<'a>(&'a self, _principal: &'a Principal) -> RevocationFuture<'a, bool> {
        Box::pin(std::future::ready(Ok(false)))
    }
}

/// Per-subject "not before" markers kept in Valkey.
///
/// A marker `<prefix>:<subject>` = unix seconds revokes every credential of
/// that subject issued at or before that instant. Markers live as long as
/// the longest credential could, then expire on their own.
#[derive(Clone)]
pub struct SubjectDenylist<C: CacheClient> {
    cache: Arc<C>,
    prefix: String,
    marker_ttl: Duration,
}

impl<C: CacheClient> SubjectDenylist<C> {
    pub fn new(cache: Arc<C>, prefix: impl Into<String>, marker_ttl: Duration) -> Self {
        Self {
            cache,
            prefix: prefix.into(),
            marker_ttl,
        }
    }

    pub fn key(&self, subject_id: Uuid) -> String {
        format!("{}:{}", self.prefix, subject_id)
    }
}

impl<C: CacheClient> RevocationPolicy for SubjectDenylist<C> {
    fn name(&self) -> &'static str {
        "subject-denylist"
    }

    fn is_revoked<'a>(&'a self, principal: &'a Principal) -> RevocationFuture<'a, bool> {
        Box::pin(async move {
            let key = self.key(principal.subject_id());
            let Some(raw) = self.cache.get_string(&key).await? else {
                return Ok(false);
            };

            let not_before: i64 = raw.trim().parse().map_err(|_| RevocationError::InvalidMarker {
                key: key.clone(),
                value: raw.clone(),
            })?;

            // A credential without `iat` cannot prove it postdates the marker.
            Ok(principal
                .issued_at()
                .is_none_or(|issued_at| issued_at <= not_before))
        })
    }

    fn revoke_subject(&self, subject_id: Uuid, at: i64) -> RevocationFuture<'_, ()> {
        Box::pin(async move {
            let key = self.key(subject_id);
            self.cache
                .set_with_ttl(&key, &at.to_string(), self.marker_ttl)
                .await?;
            tracing::info!(
                backend = self.cache.backend_name(),
                subject_id = %subject_id,
                "subject credentials revoked"
            );
            Ok(())
        })
    }

    fn restore_subject(&self, subject_id: Uuid) -> RevocationFuture<'_, bool> {
        Box::pin(async move {
            let removed = self.cache.del(&self.key(subject_id)).await?;
            Ok(removed > 0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::testing::{NOW, principal};
    use crate::services::cache::memory::{DownCache, MemoryCache};

    fn denylist<C: CacheClient>(cache: C) -> SubjectDenylist<C> {
        SubjectDenylist::new(Arc::new(cache), "revoked", Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn legacy_policy_revokes_every_non_admin() {
        // Legacy behaviour, asserted so a change to it is deliberate.
        let policy = LegacyAdminOnly;
        let user = principal(false, Some(NOW));
        assert!(policy.is_revoked(&user).await.unwrap());
        assert!(policy.is_revoked(&user).await.unwrap());

        let admin = principal(true, Some(NOW));
        assert!(!policy.is_revoked(&admin).await.unwrap());
    }

    #[tokio::test]
    async fn legacy_policy_cannot_revoke_subjects() {
        let err = LegacyAdminOnly
            .revoke_subject(Uuid::new_v4(), NOW)
            .await
            .unwrap_err();
        assert!(matches!(err, RevocationError::Unsupported("legacy-admin-only")));
    }

    #[tokio::test]
    async fn never_revoked_accepts_everyone() {
        assert!(!NeverRevoked.is_revoked(&principal(false, None)).await.unwrap());
    }

    #[tokio::test]
    async fn denylist_defaults_to_not_revoked() {
        let policy = denylist(MemoryCache::default());
        assert!(!policy.is_revoked(&principal(false, Some(NOW))).await.unwrap());
    }

    #[tokio::test]
    async fn denylist_revokes_credentials_issued_before_marker() {
        let cache = MemoryCache::default();
        let policy = denylist(cache.clone());
        let old = principal(false, Some(NOW - 10));

        policy.revoke_subject(old.subject_id(), NOW).await.unwrap();

        assert!(policy.is_revoked(&old).await.unwrap());
        assert_eq!(
            cache.ttl_of(&policy.key(old.subject_id())),
            Some(Duration::from_secs(3600))
        );
    }

    #[tokio::test]
    async fn denylist_accepts_credentials_issued_after_marker() {
        let policy = denylist(MemoryCache::default());
        let fresh = principal(false, Some(NOW + 5));

        policy.revoke_subject(fresh.subject_id(), NOW).await.unwrap();
        assert!(!policy.is_revoked(&fresh).await.unwrap());

        let without_iat = Principal::from_verified_claims(
            crate::services::auth::principal::CredentialClaims {
                user_id: fresh.subject_id().to_string(),
                is_admin: false,
                iat: None,
                exp: NOW + 60,
            },
        )
        .unwrap();
        assert!(policy.is_revoked(&without_iat).await.unwrap());
    }

    #[tokio::test]
    async fn denylist_only_affects_named_subject() {
        let policy = denylist(MemoryCache::default());
        policy.revoke_subject(Uuid::new_v4(), NOW).await.unwrap();
        assert!(!policy.is_revoked(&principal(true, Some(NOW - 1))).await.unwrap());
    }

    #[tokio::test]
    async fn restore_lifts_marker() {
        let policy = denylist(MemoryCache::default());
        let user = principal(false, Some(NOW - 1));

        policy.revoke_subject(user.subject_id(), NOW).await.unwrap();
        assert!(policy.restore_subject(user.subject_id()).await.unwrap());
        assert!(!policy.restore_subject(user.subject_id()).await.unwrap());
        assert!(!policy.is_revoked(&user).await.unwrap());
    }

    #[tokio::test]
    async fn denylist_surfaces_backend_failure() {
        let policy = denylist(DownCache);
        let err = policy
            .is_revoked(&principal(true, Some(NOW)))
            .await
            .unwrap_err();
        assert!(matches!(err, RevocationError::Cache(_)));
    }

    #[tokio::test]
    async fn corrupt_marker_is_an_error() {
        let cache = MemoryCache::default();
        let policy = denylist(cache.clone());
        let user = principal(false, Some(NOW));
        cache
            .set_with_ttl(&policy.key(user.subject_id()), "yesterday", Duration::from_secs(5))
            .await
            .unwrap();

        assert!(matches!(
            policy.is_revoked(&user).await,
            Err(RevocationError::InvalidMarker { .. })
        ));
    }
}
