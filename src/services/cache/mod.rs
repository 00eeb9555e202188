pub mod client;
pub mod valkey;

#[cfg(test)]
pub(crate) mod memory;

pub use client::{CacheClient, CacheError};
pub use valkey::ValkeyClient;
