use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// one mutex per key
///
/// Serializes check-then-write sequences for the same plate or spot while
/// leaving unrelated keys free to proceed.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// run `f` while holding the lock for `key`
    ///
    /// The key's entry is dropped once no other caller holds or waits on it.
    pub fn with_lock<R>(&self, key: &str, f: impl FnOnce() -> R) -> R {
        let lock = {
            let mut locks = self.locks.lock();
            Arc::clone(locks.entry(key.to_string()).or_default())
        };

        let result = {
            let _guard = lock.lock();
            f()
        };

        // clones are only taken under the map lock, so the count is stable here
        let mut locks = self.locks.lock();
        drop(lock);
        if locks.get(key).map_or(false, |l| Arc::strong_count(l) == 1) {
            locks.remove(key);
        }

        result
    }

    /// number of keys currently held or waited on
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_same_key_is_serialized() {
        let locks = Arc::new(KeyedLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let max_seen = Arc::clone(&max_seen);
                thread::spawn(move || {
                    locks.with_lock("ABC123", || {
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_seen.fetch_max(now, Ordering::SeqCst);
                        thread::yield_now();
                        inside.fetch_sub(1, Ordering::SeqCst);
                    })
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        assert!(locks.is_empty());
    }

    #[test]
    fn test_returns_closure_value() {
        let locks = KeyedLocks::new();
        assert!(locks.is_empty());
        assert_eq!(locks.with_lock("F1-R01", || 7), 7);
        assert_eq!(locks.with_lock("F1-R02", || 8), 8);
        assert!(locks.is_empty());
    }

    #[test]
    fn test_idle_keys_are_released() {
        let locks = KeyedLocks::new();

        let inner_len = locks.with_lock("PLATE-1", || {
            locks.with_lock("PLATE-2", || locks.len())
        });
        assert_eq!(inner_len, 2);

        for i in 0..1_000 {
            locks.with_lock(&format!("PLATE-{}", i), || ());
        }
        assert_eq!(locks.len(), 0);
    }
}
