use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use tokio::sync::Mutex;

/// One async mutex per key. An entry lives only while someone holds or waits on it.
pub struct KeyedLocks<K> {
    inner: Arc<Mutex<HashMap<K, Arc<Mutex<()>>>>>,
}

impl<K> Clone for KeyedLocks<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<K: Eq + Hash + Copy> KeyedLocks<K> {
    /// Runs `fut` while holding the lock for `key`.
    pub async fn run<F, T>(&self, key: K, fut: F) -> T
    where
        F: Future<Output = T>,
    {
        let lock = {
            let mut locks = self.inner.lock().await;
            Arc::clone(locks.entry(key).or_default())
        };

        let out = {
            let _guard = lock.lock().await;
            fut.await
        };
        drop(lock);

        // 只剩表内引用时移除；等待者持有克隆，不会被误删
        let mut locks = self.inner.lock().await;
        if locks
            .get(&key)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            locks.remove(&key);
        }
        out
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn work(active: &AtomicUsize, peak: &AtomicUsize) {
        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;
        active.fetch_sub(1, Ordering::SeqCst);
    }

    #[tokio::test]
    async fn test_entries_are_dropped_after_use() {
        let locks = KeyedLocks::default();
        assert_eq!(locks.run(7_i64, async { 42 }).await, 42);
        assert_eq!(locks.run(8_i64, async { 43 }).await, 43);
        assert_eq!(locks.len().await, 0);
    }

    #[tokio::test]
    async fn test_same_key_runs_one_at_a_time() {
        let locks = KeyedLocks::default();
        let active = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);

        tokio::join!(
            locks.run(1_i64, work(&active, &peak)),
            locks.run(1_i64, work(&active, &peak)),
            locks.run(1_i64, work(&active, &peak)),
        );
        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert_eq!(locks.len().await, 0);
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let locks = KeyedLocks::default();
        let active = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);

        tokio::join!(
            locks.run(1_i64, work(&active, &peak)),
            locks.run(2_i64, work(&active, &peak)),
        );
        assert_eq!(peak.load(Ordering::SeqCst), 2);
        assert_eq!(locks.len().await, 0);
    }
}
