/*!
 * Decision Cache
 * TTL-bounded cache of authorization outcomes
 *
 * Keys carry the policy store revision, so any policy, condition or effect
 * change makes every older entry unreachable.
 */

use super::types::AuthorizationOutcome;
use crate::core::{AccessType, Resource, SubjectId};
use crate::policy::RequestContext;
use ahash::RandomState;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Cache key for one request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    subject: SubjectId,
    access_type: AccessType,
    /// Canonical JSON of resource and context
    request: String,
    revision: u64,
}

impl CacheKey {
    /// `None` if the request cannot be rendered canonically
    pub fn new(
        subject: &SubjectId,
        access_type: AccessType,
        resource: Option<&Resource>,
        context: &RequestContext,
        revision: u64,
    ) -> Option<Self> {
        // Context serializes its timestamp in whole seconds, which is also the
        // granularity time windows are checked at.
        let request = serde_json::to_string(&(resource, context)).ok()?;
        Some(Self {
            subject: subject.clone(),
            access_type,
            request,
            revision,
        })
    }
}

struct CachedOutcome {
    outcome: AuthorizationOutcome,
    expires_at: Instant,
}

pub struct DecisionCache {
    entries: DashMap<CacheKey, CachedOutcome, RandomState>,
    max_size: usize,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl DecisionCache {
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self {
            entries: DashMap::with_capacity_and_hasher(max_size.min(1024), RandomState::new()),
            max_size,
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<AuthorizationOutcome> {
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > Instant::now() {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.outcome.clone().with_cached(true));
            }
            drop(entry);
            self.entries.remove(key);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    pub fn put(&self, key: CacheKey, outcome: AuthorizationOutcome) {
        if self.max_size == 0 {
            return;
        }

        if self.entries.len() >= self.max_size {
            let now = Instant::now();
            let revision = key.revision;
            self.entries
                .retain(|k, v| k.revision == revision && v.expires_at > now);
        }

        // Still full: drop an arbitrary entry
        if self.entries.len() >= self.max_size {
            let victim = self.entries.iter().next().map(|entry| entry.key().clone());
            if let Some(victim) = victim {
                self.entries.remove(&victim);
            }
        }

        self.entries.insert(
            key,
            CachedOutcome {
                outcome: outcome.with_cached(false),
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        CacheStats {
            size: self.entries.len(),
            max_size: self.max_size,
            hits,
            misses,
            hit_rate,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}
