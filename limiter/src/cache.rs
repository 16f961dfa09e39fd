use std::{future::Future, time::Duration};

use common::error::Res;
use dashmap::DashMap;
use tokio::time::Instant;
use uuid::Uuid;

use crate::limits::UserPlanLimits;

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

struct CachedLimits {
    limits: UserPlanLimits,
    expires_at: Instant,
}

/// Per-user plan limits, memoized for a fixed window.
///
/// Entries are only dropped through [`LimitsCache::invalidate`] and
/// [`LimitsCache::invalidate_all`]; an expired entry is never served and is
/// overwritten by the next successful fetch.
pub struct LimitsCache {
    entries: DashMap<Uuid, CachedLimits>,
    ttl: Duration,
}

impl Default for LimitsCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl LimitsCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached limits for `user_id`, if still inside the window.
    pub fn get(&self, user_id: &Uuid) -> Option<UserPlanLimits> {
        let entry = self.entries.get(user_id)?;
        if Instant::now() < entry.expires_at {
            Some(entry.limits.clone())
        } else {
            None
        }
    }

    pub fn insert(&self, user_id: Uuid, limits: UserPlanLimits) {
        let expires_at = Instant::now() + self.ttl;
        self.entries
            .insert(user_id, CachedLimits { limits, expires_at });
    }

    /// Returns the cached limits or runs `fetch` and caches its result.
    /// A failed fetch leaves the cache untouched.
    pub async fn get_or_fetch<F, Fut>(&self, user_id: Uuid, fetch: F) -> Res<UserPlanLimits>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Res<UserPlanLimits>>,
    {
        if let Some(limits) = self.get(&user_id) {
            log::debug!("Plan limits cache hit for user {}", user_id);
            return Ok(limits);
        }

        let limits = fetch().await?;
        self.insert(user_id, limits.clone());
        Ok(limits)
    }

    pub fn invalidate(&self, user_id: &Uuid) {
        if self.entries.remove(user_id).is_some() {
            log::debug!("Invalidated plan limits cache for user {}", user_id);
        }
    }

    pub fn invalidate_all(&self) {
        let count = self.entries.len();
        self.entries.clear();
        log::info!("Cleared plan limits cache ({} entries)", count);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
