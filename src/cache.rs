//! Offer caching and canonical configuration hashing.
//!
//! Results are cached under `(customer_id, config_hash)` so repeated
//! generation with unchanged inputs is served from memory. The cache is
//! strictly best-effort: a write failure never fails the caller, a read
//! failure or corrupted entry is a miss (and the entry is evicted), and
//! every anomaly is logged at warning level.
//!
//! The shipped backend is a TTL'd in-memory map behind a `parking_lot`
//! read-write lock; an external key-value store can replace it through the
//! [`CacheBackend`] trait without touching callers.
//!
//! # Canonical form
//!
//! `config_hash` is the SHA-256 of the configuration's canonical JSON:
//! object keys sorted, every decimal normalized to its minimal scale.
//! Two numerically identical configurations therefore hash equal no matter
//! how they were written, and host-side extras such as a persisted
//! `last_updated` stamp never reach `EngineConfig` and never perturb the
//! hash. The same canonical JSON is what hosts persist to disk.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::types::offer::OfferSet;
use crate::types::{EngineConfig, EngineError, EngineResult};

/// Default time-to-live for cached offer sets.
pub const DEFAULT_CACHE_TTL_SECS: i64 = 24 * 60 * 60;

/// Failure inside a cache backend. Never surfaced to engine callers.
#[derive(Debug, Clone, Error)]
#[error("cache backend error: {0}")]
pub struct CacheError(pub String);

/// A pluggable string-keyed store with per-entry TTL.
pub trait CacheBackend: Send + Sync {
    /// Fetch a live entry's payload, `None` on miss or expiry.
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store a payload under the key for `ttl`.
    fn put(&self, key: &str, payload: String, ttl: Duration) -> Result<(), CacheError>;

    /// Drop an entry if present.
    fn remove(&self, key: &str) -> Result<(), CacheError>;
}

struct StoredEntry {
    payload: String,
    expires_at: DateTime<Utc>,
}

/// The shipped in-memory backend: a TTL'd map safe for concurrent use.
#[derive(Default)]
pub struct InMemoryBackend {
    entries: RwLock<HashMap<String, StoredEntry>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live-or-expired entries currently held.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl CacheBackend for InMemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(entry) if entry.expires_at > Utc::now() => {
                    return Ok(Some(entry.payload.clone()));
                }
                Some(_) => {} // expired, evict below
                None => return Ok(None),
            }
        }
        self.entries.write().remove(key);
        Ok(None)
    }

    fn put(&self, key: &str, payload: String, ttl: Duration) -> Result<(), CacheError> {
        self.entries.write().insert(
            key.to_string(),
            StoredEntry {
                payload,
                expires_at: Utc::now() + ttl,
            },
        );
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.entries.write().remove(key);
        Ok(())
    }
}

/// Best-effort cache of finalized offer sets.
pub struct OfferCache {
    backend: Arc<dyn CacheBackend>,
    ttl: Duration,
}

impl OfferCache {
    /// In-memory cache with the default 24-hour TTL.
    pub fn in_memory() -> Self {
        Self::with_backend(
            Arc::new(InMemoryBackend::new()),
            Duration::seconds(DEFAULT_CACHE_TTL_SECS),
        )
    }

    /// Cache over a caller-supplied backend and TTL.
    pub fn with_backend(backend: Arc<dyn CacheBackend>, ttl: Duration) -> Self {
        Self { backend, ttl }
    }

    /// In-memory cache with a custom TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self::with_backend(Arc::new(InMemoryBackend::new()), ttl)
    }

    fn key(customer_id: &str, config_hash: &str) -> String {
        format!("offers:{customer_id}:{config_hash}")
    }

    /// Look up a cached offer set. Corrupted entries are evicted and read
    /// as misses.
    pub fn get(&self, customer_id: &str, config_hash: &str) -> Option<OfferSet> {
        let key = Self::key(customer_id, config_hash);
        let payload = match self.backend.get(&key) {
            Ok(Some(payload)) => payload,
            Ok(None) => return None,
            Err(error) => {
                log::warn!("cache read error for key '{key}': {error}");
                return None;
            }
        };

        match serde_json::from_str(&payload) {
            Ok(offer_set) => Some(offer_set),
            Err(error) => {
                log::warn!("corrupted cache entry for key '{key}', evicting: {error}");
                if let Err(remove_error) = self.backend.remove(&key) {
                    log::warn!("failed to evict corrupted entry '{key}': {remove_error}");
                }
                None
            }
        }
    }

    /// Store a finalized offer set. Failures are logged, never surfaced.
    pub fn put(&self, customer_id: &str, config_hash: &str, offers: &OfferSet) {
        let key = Self::key(customer_id, config_hash);
        let payload = match serde_json::to_string(offers) {
            Ok(payload) => payload,
            Err(error) => {
                log::warn!("failed to serialize offers for cache key '{key}': {error}");
                return;
            }
        };
        if let Err(error) = self.backend.put(&key, payload, self.ttl) {
            log::warn!("cache write error for key '{key}': {error}");
        }
    }
}

/// Canonical JSON for an engine configuration: sorted keys, normalized
/// decimals. This is the form hosts persist and the form that gets hashed.
pub fn canonical_config_json(config: &EngineConfig) -> EngineResult<String> {
    let value = serde_json::to_value(config.canonicalized())
        .map_err(|error| EngineError::serialization(error.to_string()))?;
    serde_json::to_string(&value).map_err(|error| EngineError::serialization(error.to_string()))
}

/// Stable SHA-256 hex digest of the canonical configuration JSON.
pub fn config_hash(config: &EngineConfig) -> EngineResult<String> {
    let canonical = canonical_config_json(config)?;
    let digest = Sha256::digest(canonical.as_bytes());
    Ok(format!("{digest:x}"))
}
