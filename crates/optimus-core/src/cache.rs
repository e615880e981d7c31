//! In-memory TTL cache for normalized quotes.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::clock::Clock;
use crate::{QualifiedSymbol, Quote, QuoteSource, UtcDateTime};

/// Default freshness window.
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

/// How a single call interacts with the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Serve a fresh entry if present; otherwise fetch and store. (Default)
    #[default]
    Use,
    /// Skip the read, always fetch, still store the result.
    Refresh,
    /// Neither read nor write.
    Bypass,
}

impl CacheMode {
    pub const fn reads(self) -> bool {
        matches!(self, Self::Use)
    }

    pub const fn writes(self) -> bool {
        !matches!(self, Self::Bypass)
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    quote: Quote,
    cached_at: UtcDateTime,
}

/// Result of a cache lookup. Stale entries are still returned so callers can
/// report their age; only `fresh` ones may be served.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedQuote {
    pub quote: Quote,
    pub cached_at: UtcDateTime,
    pub age: Duration,
    pub fresh: bool,
}

/// Diagnostic view of one entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntryStatus {
    pub cached_at: UtcDateTime,
    pub age_seconds: u64,
    pub price: f64,
    pub source: QuoteSource,
    pub is_mocked: bool,
    pub is_fresh: bool,
}

/// Diagnostic view of the whole cache.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheSnapshot {
    pub total_entries: usize,
    pub ttl_seconds: u64,
    pub entries: BTreeMap<QualifiedSymbol, CacheEntryStatus>,
}

pub type RefreshGuard = Arc<tokio::sync::Mutex<()>>;

/// Thread-safe quote cache keyed by provider-qualified symbol.
///
/// Expiry is lazy: an entry is stale once `now - cached_at >= ttl` and stays
/// in the map until overwritten or cleared. A zero TTL disables the cache.
#[derive(Clone)]
pub struct QuoteCache {
    entries: Arc<RwLock<HashMap<QualifiedSymbol, CacheEntry>>>,
    refresh_guards: Arc<Mutex<HashMap<QualifiedSymbol, RefreshGuard>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl QuoteCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            refresh_guards: Arc::new(Mutex::new(HashMap::new())),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn is_disabled(&self) -> bool {
        self.ttl.is_zero()
    }

    pub async fn lookup(&self, key: &QualifiedSymbol) -> Option<CachedQuote> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        let age = self.clock.now().saturating_since(entry.cached_at);

        Some(CachedQuote {
            quote: entry.quote.clone(),
            cached_at: entry.cached_at,
            age,
            fresh: age < self.ttl,
        })
    }

    /// Overwrites any existing entry for `key`. No-op when disabled.
    pub async fn store(&self, key: QualifiedSymbol, quote: Quote) {
        if self.is_disabled() {
            return;
        }

        let entry = CacheEntry {
            quote,
            cached_at: self.clock.now(),
        };
        self.entries.write().await.insert(key, entry);
    }

    /// Drops every entry and returns how many there were.
    pub async fn clear(&self) -> usize {
        let mut entries = self.entries.write().await;
        let removed = entries.len();
        entries.clear();
        removed
    }

    /// Number of entries, stale ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn snapshot(&self) -> CacheSnapshot {
        let entries = self.entries.read().await;
        let now = self.clock.now();

        let entries = entries
            .iter()
            .map(|(key, entry)| {
                let age = now.saturating_since(entry.cached_at);
                let status = CacheEntryStatus {
                    cached_at: entry.cached_at,
                    age_seconds: age.as_secs(),
                    price: entry.quote.price(),
                    source: entry.quote.source(),
                    is_mocked: entry.quote.is_mocked(),
                    is_fresh: age < self.ttl,
                };
                (key.clone(), status)
            })
            .collect::<BTreeMap<_, _>>();

        CacheSnapshot {
            total_entries: entries.len(),
            ttl_seconds: self.ttl.as_secs(),
            entries,
        }
    }

    /// Per-key async mutex. Holding it across lookup, fetch and store makes
    /// concurrent refreshes of one key collapse into a single upstream call.
    ///
    /// Guards are created on first use and kept for the life of the cache.
    pub fn refresh_guard(&self, key: &QualifiedSymbol) -> RefreshGuard {
        let mut guards = self
            .refresh_guards
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        guards.entry(key.clone()).or_default().clone()
    }
}

impl std::fmt::Debug for QuoteCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteCache")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
