use std::time::Duration;

use async_trait::async_trait;
use redis::{FromRedisValue, aio::ConnectionManager};

use crate::services::cache::client::{CacheClient, CacheError, CacheResult};

/// Valkey (or Redis) over a shared, auto-reconnecting `ConnectionManager`.
#[derive(Clone)]
pub struct ValkeyClient {
    manager: ConnectionManager,
}

impl std::fmt::Debug for ValkeyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValkeyClient").finish_non_exhaustive()
    }
}

impl ValkeyClient {
    /// Connect and PING once so a wrong `VALKEY_URL` fails startup, not the first request.
    pub async fn new(url: &str) -> CacheResult<Self> {
        let client = redis::Client::open(url).map_err(|e| CacheError::Unreachable(e.to_string()))?;
        let manager = client
            .get_connection_manager()
            .await
            .map_err(|e| CacheError::Unreachable(e.to_string()))?;

        let this = Self { manager };
        let pong: String = this.run("PING", &redis::cmd("PING")).await?;
        tracing::info!(reply = %pong, "connected to valkey");
        Ok(this)
    }

    async fn run<T: FromRedisValue>(&self, command: &'static str, cmd: &redis::Cmd) -> CacheResult<T> {
        let mut conn = self.manager.clone();
        cmd.query_async(&mut conn)
            .await
            .map_err(|e| CacheError::Command {
                command,
                detail: e.to_string(),
            })
    }
}

#[async_trait]
impl CacheClient for ValkeyClient {
    fn backend_name(&self) -> &'static str {
        "valkey"
    }

    async fn get_string(&self, key: &str) -> CacheResult<Option<String>> {
        self.run("GET", redis::cmd("GET").arg(key)).await
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        // EX takes whole seconds; a zero TTL would be rejected by the server.
        let seconds = ttl.as_secs().max(1);
        let _: String = self
            .run("SET", redis::cmd("SET").arg(key).arg(value).arg("EX").arg(seconds))
            .await?;
        Ok(())
    }

    async fn del(&self, key: &str) -> CacheResult<u64> {
        self.run("DEL", redis::cmd("DEL").arg(key)).await
    }
}
