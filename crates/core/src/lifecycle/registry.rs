use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::models::GiveawayId;

/// Work to run when a timer fires.
pub type TimerCallback = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

struct TimerEntry {
    token: u64,
    handle: JoinHandle<()>,
}

/// One pending single-shot timer per giveaway id.
///
/// A fired timer removes its own entry before running its callback, so a later
/// [`cancel`](TimerRegistry::cancel) never aborts a callback that is already in
/// progress.
pub struct TimerRegistry {
    name: &'static str,
    timers: Arc<Mutex<HashMap<GiveawayId, TimerEntry>>>,
    next_token: AtomicU64,
}

impl TimerRegistry {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            timers: Arc::new(Mutex::new(HashMap::new())),
            next_token: AtomicU64::new(0),
        }
    }

    /// Run `on_fire` after `delay`, replacing any timer already pending for `id`.
    pub async fn register(&self, id: GiveawayId, delay: Duration, on_fire: TimerCallback) {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let timers = Arc::clone(&self.timers);

        // Held across spawn + insert so a zero-delay timer cannot look itself up
        // before it is registered.
        let mut guard = self.timers.lock().await;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut timers = timers.lock().await;
                match timers.get(&id) {
                    Some(entry) if entry.token == token => {
                        timers.remove(&id);
                    }
                    _ => return,
                }
            }
            on_fire.await;
        });

        if let Some(previous) = guard.insert(id, TimerEntry { token, handle }) {
            previous.handle.abort();
            debug!(giveaway_id = %id, registry = self.name, "Replaced pending timer");
        }
    }

    /// Abort the pending timer for `id`. Returns whether one was pending.
    pub async fn cancel(&self, id: GiveawayId) -> bool {
        match self.timers.lock().await.remove(&id) {
            Some(entry) => {
                entry.handle.abort();
                debug!(giveaway_id = %id, registry = self.name, "Cancelled pending timer");
                true
            }
            None => false,
        }
    }

    pub async fn contains(&self, id: GiveawayId) -> bool {
        self.timers.lock().await.contains_key(&id)
    }

    pub async fn len(&self) -> usize {
        self.timers.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Abort every pending timer; returns how many there were.
    pub async fn cancel_all(&self) -> usize {
        let mut timers = self.timers.lock().await;
        let count = timers.len();
        for (_, entry) in timers.drain() {
            entry.handle.abort();
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> Arc<AtomicUsize> {
        Arc::new(AtomicUsize::new(0))
    }

    fn bump(counter: &Arc<AtomicUsize>) -> TimerCallback {
        let counter = Arc::clone(counter);
        Box::pin(async move {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_once_and_deregisters() {
        let registry = TimerRegistry::new("test");
        let fired = counter();
        let id = GiveawayId::new();

        registry.register(id, Duration::from_secs(5), bump(&fired)).await;
        assert!(registry.contains(id).await);

        tokio::time::sleep(Duration::from_secs(6)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!registry.contains(id).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_re_registering_replaces_the_pending_timer() {
        let registry = TimerRegistry::new("test");
        let first = counter();
        let second = counter();
        let id = GiveawayId::new();

        registry.register(id, Duration::from_secs(5), bump(&first)).await;
        registry.register(id, Duration::from_secs(10), bump(&second)).await;
        assert_eq!(registry.len().await, 1);

        tokio::time::sleep(Duration::from_secs(11)).await;

        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let registry = TimerRegistry::new("test");
        let fired = counter();
        let id = GiveawayId::new();

        registry.register(id, Duration::from_secs(5), bump(&fired)).await;
        assert!(registry.cancel(id).await);
        assert!(!registry.cancel(id).await);

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all() {
        let registry = TimerRegistry::new("test");
        let fired = counter();

        for _ in 0..3 {
            registry
                .register(GiveawayId::new(), Duration::from_secs(5), bump(&fired))
                .await;
        }

        assert_eq!(registry.cancel_all().await, 3);
        assert!(registry.is_empty().await);

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
