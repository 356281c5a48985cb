//! Storage Adapter Abstractions
//!
//! Provides platform-agnostic traits for the two key-value stores the sync
//! core reconciles: the local persistent store and the remote cloud store.
//!
//! Values are schemaless JSON ([`serde_json::Value`]); the sync core treats
//! payloads as opaque apart from its reserved metadata side-channel fields.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Local key-value store access trait
///
/// Abstracts the on-device persistent store:
/// - Web: localStorage / IndexedDB
/// - Desktop: settings database or config files
/// - Mobile: SharedPreferences / UserDefaults
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::LocalStorageAdapter;
///
/// async fn dump_keys(local: &dyn LocalStorageAdapter) -> Result<()> {
///     for key in local.keys().await? {
///         println!("{}", key);
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait LocalStorageAdapter: Send + Sync {
    /// List every key currently held by the store.
    async fn keys(&self) -> Result<Vec<String>>;

    /// Read the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Write a value under `key`, creating or replacing it.
    ///
    /// Returns `true` when the write was accepted by the backend.
    async fn save(&self, key: &str, value: &Value) -> Result<bool>;

    /// Read the value stored under `key`.
    ///
    /// Alias of [`get`](LocalStorageAdapter::get) kept for hosts whose local
    /// store exposes a separate load path (e.g. cached vs direct reads).
    async fn load(&self, key: &str) -> Result<Option<Value>> {
        self.get(key).await
    }
}

/// Cloud key-value store access trait
///
/// Abstracts the remote store behind an authenticated session. The sync core
/// checks [`is_authenticated`](CloudStorageAdapter::is_authenticated) before
/// making any remote call and fails fast when the session is missing.
#[async_trait]
pub trait CloudStorageAdapter: Send + Sync {
    /// Whether the adapter currently holds a usable session.
    ///
    /// Must be cheap and non-blocking; it is consulted at the start of every
    /// sync cycle.
    fn is_authenticated(&self) -> bool;

    /// List every key currently held by the remote store.
    async fn keys(&self) -> Result<Vec<String>>;

    /// Read the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Write a value under `key`, creating or replacing it.
    ///
    /// Returns `true` when the write was accepted by the backend.
    async fn set(&self, key: &str, value: &Value) -> Result<bool>;
}
