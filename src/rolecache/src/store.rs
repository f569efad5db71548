//! Two-tier role cache store
//!
//! Holds the primary cache (short TTL, freshness) and the fallback cache
//! (long or no TTL, last known good roles). Both tiers are split into
//! shards, each an LRU map behind its own mutex, so concurrent callers
//! only contend when they hash to the same shard. No lock is held across
//! an await point and every critical section is O(1) apart from sweeps.
//!
//! Expiry is expire-after-write and checked lazily: an expired entry is
//! removed by the read that finds it, and is indistinguishable from an
//! absent one to the caller.

use crate::clock::{Clock, SystemClock};
use crate::config::RoleCacheConfig;
use crate::error::Result;
use crate::types::{CacheEntry, PrincipalId, RoleSet};
use lru::LruCache;
use parking_lot::Mutex;
use std::collections::hash_map::RandomState;
use std::fmt;
use std::hash::BuildHasher;
use std::num::NonZeroUsize;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Which cache tier an entry lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheTier {
    Primary,
    Fallback,
}

impl fmt::Display for CacheTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheTier::Primary => write!(f, "primary"),
            CacheTier::Fallback => write!(f, "fallback"),
        }
    }
}

/// Why an entry left a cache without being invalidated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvictionCause {
    Expired,
    Capacity,
}

impl fmt::Display for EvictionCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvictionCause::Expired => write!(f, "expired"),
            EvictionCause::Capacity => write!(f, "capacity"),
        }
    }
}

/// Passive eviction of one principal from one tier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvictionEvent {
    pub principal: PrincipalId,
    pub tier: CacheTier,
    pub cause: EvictionCause,
}

/// Observer for passive evictions
///
/// Called after the shard lock is released. A panicking listener is
/// contained and logged; it never fails the cache operation.
pub trait EvictionListener: Send + Sync {
    fn on_eviction(&self, event: &EvictionEvent);
}

/// Default listener: one debug line per eviction
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEvictionListener;

impl EvictionListener for TracingEvictionListener {
    fn on_eviction(&self, event: &EvictionEvent) {
        debug!(
            principal = %event.principal,
            cache = %event.tier,
            cause = %event.cause,
            "Role cache entry evicted"
        );
    }
}

type Shard = Mutex<LruCache<PrincipalId, CacheEntry>>;

/// One sharded, capacity- and optionally time-bounded cache tier
struct TierCache {
    tier: CacheTier,
    ttl: Option<Duration>,
    shards: Vec<Shard>,
    hasher: RandomState,
}

impl TierCache {
    fn new(tier: CacheTier, capacity: usize, ttl: Option<Duration>, concurrency_level: usize) -> Self {
        // Never more shards than entries, so total capacity stays exact
        let shard_count = concurrency_level.min(capacity).max(1);
        let base = capacity / shard_count;
        let extra = capacity % shard_count;

        let shards = (0..shard_count)
            .map(|i| {
                let shard_capacity = base + usize::from(i < extra);
                let shard_capacity = NonZeroUsize::new(shard_capacity).unwrap_or(NonZeroUsize::MIN);
                Mutex::new(LruCache::new(shard_capacity))
            })
            .collect();

        Self {
            tier,
            ttl,
            shards,
            hasher: RandomState::new(),
        }
    }

    fn shard(&self, principal: &str) -> &Shard {
        let idx = (self.hasher.hash_one(principal) as usize) % self.shards.len();
        &self.shards[idx]
    }

    fn is_expired(&self, entry: &CacheEntry, now: Instant) -> bool {
        match self.ttl {
            Some(ttl) => entry.is_expired(ttl, now),
            None => false,
        }
    }

    fn event(&self, principal: PrincipalId, cause: EvictionCause) -> EvictionEvent {
        EvictionEvent {
            principal,
            tier: self.tier,
            cause,
        }
    }

    /// Read a live entry, dropping it if it has expired
    fn read(&self, principal: &str, now: Instant, events: &mut Vec<EvictionEvent>) -> Option<CacheEntry> {
        let mut shard = self.shard(principal).lock();
        let entry = shard.get(principal)?.clone();

        if self.is_expired(&entry, now) {
            shard.pop(principal);
            events.push(self.event(entry.principal, EvictionCause::Expired));
            return None;
        }

        Some(entry)
    }

    /// Live entry without touching recency; expired entries read as absent
    fn peek(&self, principal: &str, now: Instant) -> Option<CacheEntry> {
        let shard = self.shard(principal).lock();
        shard
            .peek(principal)
            .filter(|entry| !self.is_expired(entry, now))
            .cloned()
    }

    /// Insert into an already locked shard
    fn insert_locked(
        &self,
        shard: &mut LruCache<PrincipalId, CacheEntry>,
        entry: CacheEntry,
        now: Instant,
        events: &mut Vec<EvictionEvent>,
    ) {
        let key = entry.principal.clone();

        // `push` hands back either the replaced value for the same key or
        // the least recently used entry it pushed out
        if let Some((evicted_key, evicted)) = shard.push(key.clone(), entry) {
            if evicted_key != key {
                let cause = if self.is_expired(&evicted, now) {
                    EvictionCause::Expired
                } else {
                    EvictionCause::Capacity
                };
                events.push(self.event(evicted_key, cause));
            }
        }
    }

    fn clear(&self) {
        for shard in &self.shards {
            shard.lock().clear();
        }
    }

    fn purge_expired(&self, now: Instant, events: &mut Vec<EvictionEvent>) {
        if self.ttl.is_none() {
            return;
        }

        for shard in &self.shards {
            let mut shard = shard.lock();
            let expired: Vec<PrincipalId> = shard
                .iter()
                .filter(|(_, entry)| self.is_expired(entry, now))
                .map(|(principal, _)| principal.clone())
                .collect();

            for principal in expired {
                shard.pop(&principal);
                events.push(self.event(principal, EvictionCause::Expired));
            }
        }
    }

    fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.lock().len()).sum()
    }

    fn capacity(&self) -> usize {
        self.shards.iter().map(|shard| shard.lock().cap().get()).sum()
    }
}

#[derive(Debug, Default)]
struct StoreCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    fallback_hits: AtomicU64,
    fallback_misses: AtomicU64,
    expirations: AtomicU64,
    capacity_evictions: AtomicU64,
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub fallback_hits: u64,
    pub fallback_misses: u64,
    pub expirations: u64,
    pub capacity_evictions: u64,
    pub primary_entries: usize,
    pub fallback_entries: usize,
    pub primary_capacity: usize,
    pub fallback_capacity: usize,
}

impl CacheStats {
    /// Primary cache hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Primary + fallback role caches
///
/// Writes go to both tiers under both shard locks (primary first, then
/// fallback) so a reader never observes a half-applied `put` or
/// `invalidate` for one principal.
pub struct RoleCacheStore {
    primary: TierCache,
    fallback: TierCache,
    listener: Arc<dyn EvictionListener>,
    clock: Arc<dyn Clock>,
    counters: StoreCounters,
}

impl RoleCacheStore {
    /// Create a store from a validated configuration
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the configuration is rejected by
    /// [`RoleCacheConfig::validate`].
    pub fn new(config: &RoleCacheConfig) -> Result<Self> {
        config.validate()?;

        let primary = TierCache::new(
            CacheTier::Primary,
            config.primary_capacity,
            Some(config.primary_ttl()),
            config.concurrency_level,
        );
        let fallback = TierCache::new(
            CacheTier::Fallback,
            config.fallback_capacity,
            config.fallback_ttl(),
            config.concurrency_level,
        );

        info!(
            "RoleCacheStore initialized: primary ttl={:?} capacity={}, fallback ttl={:?} capacity={}, shards={}",
            config.primary_ttl(),
            config.primary_capacity,
            config.fallback_ttl(),
            config.fallback_capacity,
            primary.shards.len()
        );

        Ok(Self {
            primary,
            fallback,
            listener: Arc::new(TracingEvictionListener),
            clock: Arc::new(SystemClock),
            counters: StoreCounters::default(),
        })
    }

    /// Replace the eviction listener
    pub fn with_listener(mut self, listener: Arc<dyn EvictionListener>) -> Self {
        self.listener = listener;
        self
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Store roles in both tiers with one shared timestamp
    ///
    /// Overwrites any existing entry. Capacity eviction is silent apart
    /// from the listener notification.
    pub fn put(&self, principal: &str, roles: RoleSet) {
        let now = self.clock.now();
        let entry = CacheEntry::new(principal, roles, now);
        let mut events = Vec::new();

        {
            let mut primary = self.primary.shard(principal).lock();
            let mut fallback = self.fallback.shard(principal).lock();
            self.primary.insert_locked(&mut primary, entry.clone(), now, &mut events);
            self.fallback.insert_locked(&mut fallback, entry, now, &mut events);
        }

        self.dispatch(events);
    }

    /// Fresh roles from the primary cache, or `None` if absent or expired
    pub fn get(&self, principal: &str) -> Option<RoleSet> {
        let now = self.clock.now();
        let mut events = Vec::new();
        let entry = self.primary.read(principal, now, &mut events);
        self.dispatch(events);

        match entry {
            Some(entry) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.roles)
            }
            None => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Last known good roles from the fallback cache
    pub fn get_from_fallback(&self, principal: &str) -> Option<RoleSet> {
        let now = self.clock.now();
        let mut events = Vec::new();
        let entry = self.fallback.read(principal, now, &mut events);
        self.dispatch(events);

        match entry {
            Some(entry) => {
                self.counters.fallback_hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.roles)
            }
            None => {
                self.counters.fallback_misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Remove a principal from both tiers
    pub fn invalidate(&self, principal: &str) {
        let mut primary = self.primary.shard(principal).lock();
        let mut fallback = self.fallback.shard(principal).lock();
        primary.pop(principal);
        fallback.pop(principal);
    }

    /// Clear both tiers
    pub fn invalidate_all(&self) {
        self.primary.clear();
        self.fallback.clear();
        info!("Role caches cleared");
    }

    /// Sweep expired entries from both tiers, returning how many were dropped
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut events = Vec::new();
        self.primary.purge_expired(now, &mut events);
        self.fallback.purge_expired(now, &mut events);

        let purged = events.len();
        self.dispatch(events);
        purged
    }

    /// Live primary entry with its timestamp
    ///
    /// Follows the same expiry rule as `get` but neither updates recency
    /// nor removes anything, so it is safe for diagnostics.
    pub fn peek_primary(&self, principal: &str) -> Option<CacheEntry> {
        self.primary.peek(principal, self.clock.now())
    }

    /// Live fallback entry with its timestamp, without side effects
    pub fn peek_fallback(&self, principal: &str) -> Option<CacheEntry> {
        self.fallback.peek(principal, self.clock.now())
    }

    pub fn primary_len(&self) -> usize {
        self.primary.len()
    }

    pub fn fallback_len(&self) -> usize {
        self.fallback.len()
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            fallback_hits: self.counters.fallback_hits.load(Ordering::Relaxed),
            fallback_misses: self.counters.fallback_misses.load(Ordering::Relaxed),
            expirations: self.counters.expirations.load(Ordering::Relaxed),
            capacity_evictions: self.counters.capacity_evictions.load(Ordering::Relaxed),
            primary_entries: self.primary.len(),
            fallback_entries: self.fallback.len(),
            primary_capacity: self.primary.capacity(),
            fallback_capacity: self.fallback.capacity(),
        }
    }

    fn dispatch(&self, events: Vec<EvictionEvent>) {
        for event in events {
            match event.cause {
                EvictionCause::Expired => self.counters.expirations.fetch_add(1, Ordering::Relaxed),
                EvictionCause::Capacity => self.counters.capacity_evictions.fetch_add(1, Ordering::Relaxed),
            };

            let listener = &self.listener;
            if catch_unwind(AssertUnwindSafe(|| listener.on_eviction(&event))).is_err() {
                warn!(principal = %event.principal, "Eviction listener panicked");
            }
        }
    }
}
