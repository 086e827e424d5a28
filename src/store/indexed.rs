//! Named, ordered lists addressed by position

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};
use serde_json::Value;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info};

use crate::error::{Error, Result};
use super::backend::StoreBackend;

/// Positional list store over a [`StoreBackend`].
///
/// Every operation on a list runs under that list's fair async mutex, so
/// read-modify-write sequences on one list apply strictly in submission order.
/// Different lists do not wait on each other.
pub struct IndexedStore {
    backend: Arc<dyn StoreBackend>,
    queues: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl IndexedStore {
    pub fn new(backend: Arc<dyn StoreBackend>) -> Self {
        Self {
            backend,
            queues: Mutex::new(HashMap::new()),
        }
    }

    /// Append `value`; returns the index it landed at
    pub async fn push(&self, list: &str, value: Value) -> Result<usize> {
        let queue = self.queue(list);
        let _turn = queue.lock().await;

        let mut entries = self.backend.load(list).await?;
        entries.push(value);
        self.backend.save(list, &entries).await?;

        let index = entries.len() - 1;
        info!("Appended entry {} to {}", index, list);
        Ok(index)
    }

    pub async fn get(&self, list: &str, index: usize) -> Result<Value> {
        let queue = self.queue(list);
        let _turn = queue.lock().await;

        let mut entries = self.backend.load(list).await?;
        if index >= entries.len() {
            return Err(out_of_range(list, index, entries.len()));
        }
        Ok(entries.swap_remove(index))
    }

    pub async fn list(&self, list: &str) -> Result<Vec<Value>> {
        let queue = self.queue(list);
        let _turn = queue.lock().await;
        self.backend.load(list).await
    }

    /// Remove the entry at `index`; returns the remaining entries
    pub async fn remove(&self, list: &str, index: usize) -> Result<Vec<Value>> {
        self.remove_where(list, index, None).await
    }

    /// Remove the entry at `index` only if it still equals `expected`
    pub async fn remove_if(&self, list: &str, index: usize, expected: &Value) -> Result<Vec<Value>> {
        self.remove_where(list, index, Some(expected)).await
    }

    async fn remove_where(&self, list: &str, index: usize, expected: Option<&Value>) -> Result<Vec<Value>> {
        let queue = self.queue(list);
        let _turn = queue.lock().await;

        let mut entries = self.backend.load(list).await?;
        let Some(current) = entries.get(index) else {
            return Err(out_of_range(list, index, entries.len()));
        };
        if expected.is_some_and(|expected| expected != current) {
            debug!("Entry {} of {} no longer matches the caller's snapshot", index, list);
            return Err(Error::StaleIndex {
                list: list.to_string(),
                index,
            });
        }

        entries.remove(index);
        self.backend.save(list, &entries).await?;
        info!("Removed entry {} from {}, {} left", index, list, entries.len());
        Ok(entries)
    }

    fn queue(&self, list: &str) -> Arc<AsyncMutex<()>> {
        let mut queues = self.queues.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(queues.entry(list.to_string()).or_default())
    }
}

fn out_of_range(list: &str, index: usize, len: usize) -> Error {
    Error::NotFound(format!("entry {} of {} ({} entries)", index, list, len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::atomic::{AtomicBool, Ordering}, time::Duration};
    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::{Notify, Semaphore};
    use crate::store::backend::MemoryBackend;

    /// Holds the next save to `held` until `release` gets a permit
    struct HeldBackend {
        inner: MemoryBackend,
        held: &'static str,
        armed: AtomicBool,
        entered: Notify,
        release: Semaphore,
    }

    impl HeldBackend {
        fn new(held: &'static str) -> Self {
            Self {
                inner: MemoryBackend::new(),
                held,
                armed: AtomicBool::new(false),
                entered: Notify::new(),
                release: Semaphore::new(0),
            }
        }
    }

    #[async_trait]
    impl StoreBackend for HeldBackend {
        async fn load(&self, list: &str) -> Result<Vec<Value>> {
            self.inner.load(list).await
        }

        async fn save(&self, list: &str, entries: &[Value]) -> Result<()> {
            if list == self.held && self.armed.swap(false, Ordering::SeqCst) {
                self.entered.notify_one();
                let _permit = self.release.acquire().await;
            }
            self.inner.save(list, entries).await
        }
    }

    fn store() -> Arc<IndexedStore> {
        Arc::new(IndexedStore::new(Arc::new(MemoryBackend::new())))
    }

    #[tokio::test]
    async fn remove_shifts_following_entries() {
        let store = store();
        for n in 0..3 {
            store.push("list", json!(n)).await.unwrap();
        }

        let remaining = store.remove("list", 1).await.unwrap();
        assert_eq!(remaining, vec![json!(0), json!(2)]);
        assert_eq!(store.get("list", 1).await.unwrap(), json!(2));
        assert!(matches!(store.get("list", 2).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn lists_are_independent() {
        let store = store();
        store.push("a", json!("x")).await.unwrap();

        assert!(store.list("b").await.unwrap().is_empty());
        assert!(matches!(store.remove("b", 0).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn guarded_remove_rejects_drifted_index() {
        let store = store();
        store.push("list", json!("first")).await.unwrap();
        store.push("list", json!("second")).await.unwrap();
        store.remove("list", 0).await.unwrap();

        let stale = store.remove_if("list", 0, &json!("first")).await;
        assert!(matches!(stale, Err(Error::StaleIndex { index: 0, .. })));

        let remaining = store.remove_if("list", 0, &json!("second")).await.unwrap();
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn concurrent_pushes_are_all_kept() {
        let store = store();
        let tasks: Vec<_> = (0..16)
            .map(|n| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.push("list", json!(n)).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(store.list("list").await.unwrap().len(), 16);
    }

    #[tokio::test]
    async fn overlapping_operations_apply_in_submission_order() {
        let backend = Arc::new(HeldBackend::new("list"));
        let store = Arc::new(IndexedStore::new(backend.clone()));
        for name in ["a", "b", "c"] {
            store.push("list", json!(name)).await.unwrap();
        }

        backend.armed.store(true, Ordering::SeqCst);
        let remove = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.remove("list", 0).await })
        };
        backend.entered.notified().await;

        // Submitted while the remove is mid-write; both must see its result.
        let get = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.get("list", 0).await })
        };
        let guarded = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.remove_if("list", 0, &json!("b")).await })
        };
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(!get.is_finished());
        assert!(!guarded.is_finished());

        backend.release.add_permits(1);
        assert_eq!(remove.await.unwrap().unwrap(), vec![json!("b"), json!("c")]);
        assert_eq!(get.await.unwrap().unwrap(), json!("b"));
        assert_eq!(guarded.await.unwrap().unwrap(), vec![json!("c")]);
    }

    #[tokio::test]
    async fn held_list_does_not_block_other_lists() {
        let backend = Arc::new(HeldBackend::new("list"));
        let store = Arc::new(IndexedStore::new(backend.clone()));

        backend.armed.store(true, Ordering::SeqCst);
        let held = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.push("list", json!("held")).await })
        };
        backend.entered.notified().await;

        let index = tokio::time::timeout(Duration::from_secs(1), store.push("other", json!("free")))
            .await
            .expect("other list was blocked")
            .unwrap();
        assert_eq!(index, 0);
        assert_eq!(store.list("other").await.unwrap(), vec![json!("free")]);
        assert!(!held.is_finished());

        backend.release.add_permits(1);
        assert_eq!(held.await.unwrap().unwrap(), 0);
    }
}
