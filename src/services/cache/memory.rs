//! In-process `CacheClient` doubles for tests.
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;

use crate::services::cache::client::{CacheClient, CacheError, CacheResult};

#[derive(Clone, Debug, Default)]
pub struct MemoryCache {
    entries: Arc<Mutex<HashMap<String, (String, Duration)>>>,
}

impl MemoryCache {
    pub fn ttl_of(&self, key: &str) -> Option<Duration> {
        self.entries.lock().unwrap().get(key).map(|(_, ttl)| *ttl)
    }
}

#[async_trait]
impl CacheClient for MemoryCache {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get_string(&self, key: &str) -> CacheResult<Option<String>> {
        Ok(self.entries.lock().unwrap().get(key).map(|(v, _)| v.clone()))
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_string(), ttl));
        Ok(())
    }

    async fn del(&self, key: &str) -> CacheResult<u64> {
        Ok(self.entries.lock().unwrap().remove(key).map_or(0, |_| 1))
    }
}

/// Every command fails, as if the backend were unreachable.
#[derive(Clone, Debug, Default)]
pub struct DownCache;

#[async_trait]
impl CacheClient for DownCache {
    fn backend_name(&self) -> &'static str {
        "down"
    }

    async fn get_string(&self, _key: &str) -> CacheResult<Option<String>> {
        Err(CacheError::Unreachable("connection refused".into()))
    }

    async fn set_with_ttl(&self, _key: &str, _value: &str, _ttl: Duration) -> CacheResult<()> {
        Err(CacheError::Unreachable("connection refused".into()))
    }

    async fn del(&self, _key: &str) -> CacheResult<u64> {
        Err(CacheError::Unreachable("connection refused".into()))
    }
}
