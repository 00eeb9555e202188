//! Key/value store behind the subject denylist.
//!
//! Values are plain strings (unix seconds for revocation markers) and always
//! carry a TTL, so the store never grows past the credential lifetime.
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub type CacheResult<T> = Result<T, CacheError>;

/// Kept apart from `AppError`: the revocation gateway turns any of these into
/// a refused request, while admin routes report them as internal errors.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend unreachable: {0}")]
    Unreachable(String),
    #[error("cache command {command} failed: {detail}")]
    Command {
        command: &'static str,
        detail: String,
    },
}

#[async_trait]
pub trait CacheClient: Send + Sync + 'static {
    /// Short backend label for logs.
    fn backend_name(&self) -> &'static str;

    async fn get_string(&self, key: &str) -> CacheResult<Option<String>>;

    /// Overwrites any existing value.
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    /// Number of keys removed (0 or 1).
    async fn del(&self, key: &str) -> CacheResult<u64>;
}
