//! Client-side query cache.
//!
//! Keyed store mapping query identity to its latest state. Concurrent
//! requests for the same key are deduplicated: one caller runs the fetch,
//! the rest await its result over a watch channel. Mutations invalidate
//! keys explicitly; a fetch that completes after its key was invalidated
//! writes into an orphaned channel and is discarded.
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use log::debug;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{watch, Mutex};

use crate::gateway::GatewayError;

/// Semantic identity of a fetched result.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Communities,
    CommunityName(i64),
    CommunityPosts(i64),
    RecentPosts,
    Post(i64),
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::Communities => write!(f, "communities"),
            QueryKey::CommunityName(id) => write!(f, "community-name:{}", id),
            QueryKey::CommunityPosts(id) => write!(f, "community-posts:{}", id),
            QueryKey::RecentPosts => write!(f, "recent-posts"),
            QueryKey::Post(id) => write!(f, "post:{}", id),
        }
    }
}

/// Tri-state (plus idle) lifecycle of a cached query.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryState {
    Idle,
    Pending,
    Ready(Value),
    Failed(String),
}

struct Slot {
    tx: watch::Sender<QueryState>,
}

#[derive(Clone)]
pub struct QueryCache {
    slots: Arc<Mutex<HashMap<QueryKey, Slot>>>,
}

enum Role {
    Leader(watch::Sender<QueryState>),
    Follower(watch::Receiver<QueryState>),
    Hit(Value),
}

impl QueryCache {
    pub fn new() -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Serve the cached value for `key`, or run `fetch` to populate it.
    ///
    /// If a fetch for this key is already in flight the caller awaits that
    /// result instead of issuing its own. A recorded failure is not served
    /// from cache: the next caller retries.
    pub async fn get_or_fetch<T, F, Fut>(&self, key: QueryKey, fetch: F) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, GatewayError>>,
    {
        let role = {
            let mut slots = self.slots.lock().await;
            match slots.get(&key) {
                Some(slot) => {
                    let current = slot.tx.borrow().clone();
                    match current {
                        QueryState::Ready(value) => Role::Hit(value),
                        QueryState::Pending => Role::Follower(slot.tx.subscribe()),
                        QueryState::Idle | QueryState::Failed(_) => {
                            slot.tx.send_replace(QueryState::Pending);
                            Role::Leader(slot.tx.clone())
                        }
                    }
                }
                None => {
                    let (tx, _rx) = watch::channel(QueryState::Pending);
                    slots.insert(key.clone(), Slot { tx: tx.clone() });
                    Role::Leader(tx)
                }
            }
        };

        match role {
            Role::Hit(value) => {
                debug!("cache hit: {}", key);
                Ok(serde_json::from_value(value)?)
            }
            Role::Leader(tx) => {
                debug!("cache miss: {}", key);
                match fetch().await {
                    Ok(value) => {
                        tx.send_replace(QueryState::Ready(value.clone()));
                        Ok(serde_json::from_value(value)?)
                    }
                    Err(err) => {
                        tx.send_replace(QueryState::Failed(err.to_string()));
                        Err(err)
                    }
                }
            }
            Role::Follower(mut rx) => {
                debug!("awaiting in-flight fetch: {}", key);
                loop {
                    let state = rx.borrow_and_update().clone();
                    match state {
                        QueryState::Ready(value) => return Ok(serde_json::from_value(value)?),
                        QueryState::Failed(message) => return Err(GatewayError::Remote(message)),
                        QueryState::Idle | QueryState::Pending => {}
                    }
                    if rx.changed().await.is_err() {
                        // Leader's slot was dropped without settling.
                        return Err(GatewayError::Remote("query abandoned".to_string()));
                    }
                }
            }
        }
    }

    /// Observe state transitions for `key`. Dropping the receiver
    /// unsubscribes.
    pub async fn subscribe(&self, key: &QueryKey) -> watch::Receiver<QueryState> {
        let mut slots = self.slots.lock().await;
        match slots.get(key) {
            Some(slot) => slot.tx.subscribe(),
            None => {
                let (tx, rx) = watch::channel(QueryState::Idle);
                slots.insert(key.clone(), Slot { tx });
                rx
            }
        }
    }

    /// Snapshot of the current state for `key`.
    pub async fn status(&self, key: &QueryKey) -> QueryState {
        let slots = self.slots.lock().await;
        slots
            .get(key)
            .map(|slot| slot.tx.borrow().clone())
            .unwrap_or(QueryState::Idle)
    }

    /// Drop the entry for `key`. An in-flight fetch for the old entry
    /// settles into the orphaned channel and never becomes visible here.
    pub async fn invalidate(&self, key: &QueryKey) {
        let mut slots = self.slots.lock().await;
        if slots.remove(key).is_some() {
            debug!("cache invalidated: {}", key);
        }
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use serde_json::json;

    #[tokio::test]
    async fn ready_value_is_served_without_refetch() {
        let cache = QueryCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let got: Vec<i64> = cache
                .get_or_fetch(QueryKey::Communities, || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Ok(json!([1, 2, 3])) }
                })
                .await
                .unwrap();
            assert_eq!(got, vec![1, 2, 3]);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_fetches_for_one_key_run_once() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let (started_tx, started_rx) = tokio::sync::oneshot::channel::<()>();
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

        let leader = {
            let cache = cache.clone();
            let calls = calls.clone();
            tokio::spawn(async move {
                cache
                    .get_or_fetch::<i64, _, _>(QueryKey::RecentPosts, move || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        async move {
                            let _ = started_tx.send(());
                            let _ = release_rx.await;
                            Ok(json!(7))
                        }
                    })
                    .await
            })
        };

        // Second caller arrives while the first fetch is still in flight.
        started_rx.await.unwrap();
        let follower = {
            let cache = cache.clone();
            let calls = calls.clone();
            tokio::spawn(async move {
                cache
                    .get_or_fetch::<i64, _, _>(QueryKey::RecentPosts, move || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        async { Ok(json!(999)) }
                    })
                    .await
            })
        };

        // Give the follower a chance to subscribe, then let the leader finish.
        tokio::task::yield_now().await;
        release_tx.send(()).unwrap();

        assert_eq!(leader.await.unwrap().unwrap(), 7);
        assert_eq!(follower.await.unwrap().unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_is_recorded_but_not_sticky() {
        let cache = QueryCache::new();

        let err = cache
            .get_or_fetch::<i64, _, _>(QueryKey::Post(1), || async {
                Err(GatewayError::Remote("500 -> boom".to_string()))
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("500 -> boom"));
        assert_eq!(
            cache.status(&QueryKey::Post(1)).await,
            QueryState::Failed("remote operation failed: 500 -> boom".to_string())
        );

        // A new attempt retries rather than replaying the failure.
        let got: i64 = cache
            .get_or_fetch(QueryKey::Post(1), || async { Ok(json!(42)) })
            .await
            .unwrap();
        assert_eq!(got, 42);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let cache = QueryCache::new();
        let calls = AtomicUsize::new(0);

        let _: i64 = cache
            .get_or_fetch(QueryKey::Communities, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(json!(1)) }
            })
            .await
            .unwrap();
        cache.invalidate(&QueryKey::Communities).await;
        assert_eq!(cache.status(&QueryKey::Communities).await, QueryState::Idle);

        let _: i64 = cache
            .get_or_fetch(QueryKey::Communities, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(json!(2)) }
            })
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn late_result_after_invalidation_is_discarded() {
        let cache = QueryCache::new();

        let (started_tx, started_rx) = tokio::sync::oneshot::channel::<()>();
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

        let leader = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .get_or_fetch::<i64, _, _>(QueryKey::RecentPosts, move || async move {
                        let _ = started_tx.send(());
                        let _ = release_rx.await;
                        Ok(json!(7))
                    })
                    .await
            })
        };

        started_rx.await.unwrap();
        cache.invalidate(&QueryKey::RecentPosts).await;
        release_tx.send(()).unwrap();

        // The leader still gets its own result...
        assert_eq!(leader.await.unwrap().unwrap(), 7);
        // ...but the cache never saw it.
        assert_eq!(cache.status(&QueryKey::RecentPosts).await, QueryState::Idle);
    }

    #[tokio::test]
    async fn subscribe_observes_pending_then_ready() {
        let cache = QueryCache::new();
        let mut rx = cache.subscribe(&QueryKey::Communities).await;
        assert_eq!(*rx.borrow(), QueryState::Idle);

        let _: i64 = cache
            .get_or_fetch(QueryKey::Communities, || async { Ok(json!(5)) })
            .await
            .unwrap();

        rx.changed().await.unwrap();
        // The slot may have settled straight through Pending; the final
        // observed state is Ready.
        let mut last = rx.borrow_and_update().clone();
        while rx.has_changed().unwrap_or(false) {
            rx.changed().await.unwrap();
            last = rx.borrow_and_update().clone();
        }
        assert_eq!(last, QueryState::Ready(json!(5)));
    }
}
