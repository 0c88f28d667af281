//! `SettingsStore` trait — the storage seam for onboarding flags.
//!
//! Mirrors browser key/value storage: string keys, string values, no
//! structured types and no transactions. Concurrent writers race and the
//! last write wins.

use async_trait::async_trait;

use crate::error::DatabaseError;

/// Backend-agnostic key/value settings store.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Read a value. `Ok(None)` when the key was never written.
    async fn get(&self, key: &str) -> Result<Option<String>, DatabaseError>;

    /// Write (or overwrite) a value.
    async fn set(&self, key: &str, value: &str) -> Result<(), DatabaseError>;

    /// Remove a key. Returns whether it existed.
    async fn remove(&self, key: &str) -> Result<bool, DatabaseError>;
}
