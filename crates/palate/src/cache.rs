//! Short-TTL snapshot cache
//!
//! Read-through cache of each user's last blended result. Snapshots are
//! replayed verbatim (flagged `cached`) while fresh; TTL expiry is the
//! only invalidation path. Writes are idempotent overwrites keyed by user
//! id, so duplicate concurrent recomputation for one user is harmless.

use crate::types::RecommendationSnapshot;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use uuid::Uuid;

pub struct RecommendationCache {
    entries: DashMap<Uuid, RecommendationSnapshot>,
    ttl: Duration,
}

impl RecommendationCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// The snapshot TTL applied to newly generated entries, in seconds
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }

    /// A fresh snapshot for the user, marked as served from cache
    pub fn get_fresh(&self, user_id: Uuid) -> Option<RecommendationSnapshot> {
        let entry = self.entries.get(&user_id)?;
        if entry.is_fresh(Utc::now()) {
            Some(entry.value().clone().as_cached())
        } else {
            None
        }
    }

    /// Store (or overwrite) the user's snapshot
    pub fn insert(&self, snapshot: RecommendationSnapshot) {
        self.entries.insert(snapshot.user_id, snapshot);
    }

    /// Drop entries past their TTL
    pub fn purge_expired(&self) {
        let now = Utc::now();
        self.entries.retain(|_, snapshot| snapshot.is_fresh(now));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
