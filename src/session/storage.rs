// Session storage: one slot per identity, spread across locked shards

use super::types::Session;
use std::collections::HashMap;
use std::collections::hash_map::RandomState;
use std::hash::BuildHasher;
use tokio::sync::RwLock;
use tracing::debug;

type Shard = RwLock<HashMap<String, Session>>;

/// In-memory session storage.
///
/// Identities are hashed onto a fixed set of shards, each behind its own lock.
/// Every read-modify-write on one identity happens under that identity's shard
/// write lock; identities on other shards proceed in parallel.
pub struct MemorySessionStorage {
    shards: Box<[Shard]>,
    hasher: RandomState,
}

impl MemorySessionStorage {
    pub fn new(shard_count: usize) -> Self {
        let shard_count = shard_count.max(1);
        let shards = (0..shard_count)
            .map(|_| RwLock::new(HashMap::new()))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            shards,
            hasher: RandomState::new(),
        }
    }

    fn shard(&self, identity: &str) -> &Shard {
        let index = (self.hasher.hash_one(identity) as usize) % self.shards.len();
        &self.shards[index]
    }

    /// Run `f` against the identity's slot atomically.
    ///
    /// The slot is `None` when no session is stored. Whatever `f` leaves in the
    /// slot is what remains stored; setting it to `None` deletes the session.
    pub async fn update<R>(&self, identity: &str, f: impl FnOnce(&mut Option<Session>) -> R) -> R {
        let mut shard = self.shard(identity).write().await;

        let (key, mut slot) = match shard.remove_entry(identity) {
            Some((key, session)) => (key, Some(session)),
            None => (identity.to_string(), None),
        };

        let result = f(&mut slot);

        if let Some(session) = slot {
            shard.insert(key, session);
        }

        result
    }

    /// Copy of the stored session, live or not
    pub async fn get(&self, identity: &str) -> Option<Session> {
        self.shard(identity).read().await.get(identity).cloned()
    }

    /// Remove every session for which `is_expired` holds and return them
    pub async fn remove_where(&self, is_expired: impl Fn(&Session) -> bool) -> Vec<Session> {
        let mut removed = Vec::new();

        for shard in self.shards.iter() {
            let mut shard = shard.write().await;
            let expired: Vec<String> = shard
                .iter()
                .filter(|(_, session)| is_expired(session))
                .map(|(identity, _)| identity.clone())
                .collect();

            for identity in expired {
                if let Some(session) = shard.remove(&identity) {
                    removed.push(session);
                }
            }
        }

        if !removed.is_empty() {
            debug!("Removed {} session(s) from storage", removed.len());
        }
        removed
    }

    /// Copies of every stored session
    pub async fn all(&self) -> Vec<Session> {
        let mut sessions = Vec::new();
        for shard in self.shards.iter() {
            sessions.extend(shard.read().await.values().cloned());
        }
        sessions
    }

    pub async fn len(&self) -> usize {
        let mut total = 0;
        for shard in self.shards.iter() {
            total += shard.read().await.len();
        }
        total
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemorySessionStorage {
    fn default() -> Self {
        Self::new(16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tokio::time::Instant;

    fn session(identity: &str, profile: &str) -> Session {
        Session::new(
            identity.to_string(),
            profile.to_string(),
            format!("sess_{}", profile),
            "127.0.0.1".to_string(),
            Utc::now(),
            Instant::now(),
        )
    }

    #[tokio::test]
    async fn test_update_inserts_and_replaces() {
        let storage = MemorySessionStorage::new(4);

        storage
            .update("a@x", |slot| *slot = Some(session("a@x", "P1")))
            .await;
        let previous = storage
            .update("a@x", |slot| slot.replace(session("a@x", "P2")))
            .await;

        assert_eq!(previous.unwrap().profile, "P1");
        assert_eq!(storage.get("a@x").await.unwrap().profile, "P2");
        assert_eq!(storage.len().await, 1);
    }

    #[tokio::test]
    async fn test_update_can_delete() {
        let storage = MemorySessionStorage::new(4);
        storage
            .update("a@x", |slot| *slot = Some(session("a@x", "P1")))
            .await;

        let removed = storage.update("a@x", |slot| slot.take()).await;
        assert!(removed.is_some());
        assert!(storage.get("a@x").await.is_none());
        assert!(storage.is_empty().await);
    }

    #[tokio::test]
    async fn test_untouched_missing_slot_stays_empty() {
        let storage = MemorySessionStorage::new(4);
        let seen = storage.update("ghost@x", |slot| slot.is_some()).await;
        assert!(!seen);
        assert!(storage.is_empty().await);
    }

    #[tokio::test]
    async fn test_remove_where() {
        let storage = MemorySessionStorage::new(2);
        for (identity, profile) in [("a@x", "old"), ("b@x", "new"), ("c@x", "old")] {
            storage
                .update(identity, |slot| *slot = Some(session(identity, profile)))
                .await;
        }

        let removed = storage.remove_where(|s| s.profile == "old").await;
        assert_eq!(removed.len(), 2);

        let remaining = storage.all().await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].identity, "b@x");
    }

    #[tokio::test]
    async fn test_zero_shards_is_clamped() {
        let storage = MemorySessionStorage::new(0);
        storage
            .update("a@x", |slot| *slot = Some(session("a@x", "P1")))
            .await;
        assert_eq!(storage.len().await, 1);
    }
}
