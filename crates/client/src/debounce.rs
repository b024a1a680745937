//! Keyed debounce scheduler.
//!
//! [`Debouncer::schedule`] arms one cancellable delayed task per key.
//! Scheduling again for the same key cancels the pending timer, so only
//! the last schedule in a burst runs. A key stays *active* from the first
//! schedule until its surviving task has finished running, which covers the
//! in-flight write as well as the timer.
//!
//! Tasks receive a [`Ticket`]; once a later schedule supersedes it,
//! [`Ticket::is_current`] turns false and the task should leave shared
//! state alone.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

struct Entry {
    generation: u64,
    timer: CancellationToken,
}

type Registry<K> = Arc<Mutex<HashMap<K, Entry>>>;

fn lock<K>(registry: &Registry<K>) -> MutexGuard<'_, HashMap<K, Entry>> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle given to a fired task.
pub struct Ticket<K> {
    key: K,
    generation: u64,
    registry: Registry<K>,
}

impl<K: Eq + Hash> Ticket<K> {
    pub fn key(&self) -> &K {
        &self.key
    }

    /// `false` once a newer schedule for the same key exists.
    pub fn is_current(&self) -> bool {
        lock(&self.registry)
            .get(&self.key)
            .is_some_and(|e| e.generation == self.generation)
    }
}

pub struct Debouncer<K> {
    registry: Registry<K>,
    next_generation: Arc<AtomicU64>,
    /// Parent of every timer; cancelled by [`Debouncer::cancel_all`].
    root: CancellationToken,
}

impl<K> Clone for Debouncer<K> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            next_generation: Arc::clone(&self.next_generation),
            root: self.root.clone(),
        }
    }
}

impl<K> Default for Debouncer<K> {
    fn default() -> Self {
        Self {
            registry: Arc::new(Mutex::new(HashMap::new())),
            next_generation: Arc::new(AtomicU64::new(0)),
            root: CancellationToken::new(),
        }
    }
}

impl<K> Debouncer<K>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` after `delay` unless another schedule for `key` arrives
    /// first. Must be called from within a tokio runtime.
    pub fn schedule<F, Fut>(&self, key: K, delay: Duration, task: F)
    where
        F: FnOnce(Ticket<K>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let timer = self.root.child_token();

        if let Some(previous) = lock(&self.registry).insert(
            key.clone(),
            Entry {
                generation,
                timer: timer.clone(),
            },
        ) {
            previous.timer.cancel();
        }

        let registry = Arc::clone(&self.registry);
        tokio::spawn(async move {
            let fired = tokio::select! {
                _ = timer.cancelled() => false,
                _ = tokio::time::sleep(delay) => true,
            };

            if fired {
                let ticket = Ticket {
                    key: key.clone(),
                    generation,
                    registry: Arc::clone(&registry),
                };
                task(ticket).await;
            }

            let mut entries = lock(&registry);
            if entries.get(&key).is_some_and(|e| e.generation == generation) {
                entries.remove(&key);
            }
        });
    }

    /// Whether `key` has a pending timer or a running task.
    pub fn is_active(&self, key: &K) -> bool {
        lock(&self.registry).contains_key(key)
    }

    pub fn active_count(&self) -> usize {
        lock(&self.registry).len()
    }

    /// Cancel the pending timer for `key`. A task that already fired keeps
    /// running but its ticket stops being current.
    pub fn cancel(&self, key: &K) -> bool {
        match lock(&self.registry).remove(key) {
            Some(entry) => {
                entry.timer.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel every pending timer. Timers scheduled afterwards never fire;
    /// this is the shutdown path.
    pub fn cancel_all(&self) {
        self.root.cancel();
        lock(&self.registry).clear();
    }
}
