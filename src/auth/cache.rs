// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory API client directory with optional whole-cache expiry.
//!
//! Entries are keyed by lowercased client id. When a lifetime is set, a
//! background task clears the whole directory once per elapsed interval and
//! broadcasts a [`CacheCleared`] event to subscribers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::client::ApiClient;
use super::error::CacheError;

/// Capacity of the expiry event channel. Slow subscribers see `Lagged`.
const EVENT_CHANNEL_CAPACITY: usize = 16;

type ClientMap = HashMap<String, ApiClient>;

/// Emitted each time the expiry timer clears the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheCleared {
    /// Number of clients removed
    pub evicted: usize,
}

/// Thread-safe client directory shared by all in-flight requests.
pub struct ApiClientCache {
    clients: Arc<RwLock<ClientMap>>,
    lifetime: Mutex<Duration>,
    expiry: Mutex<Option<CancellationToken>>,
    events: broadcast::Sender<CacheCleared>,
}

impl Default for ApiClientCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiClientCache {
    /// Create an empty cache whose entries never expire.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            clients: Arc::new(RwLock::new(HashMap::new())),
            lifetime: Mutex::new(Duration::ZERO),
            expiry: Mutex::new(None),
            events,
        }
    }

    /// Create an empty cache cleared every `lifetime`.
    ///
    /// A zero lifetime disables expiry. A positive one must be set from
    /// within a Tokio runtime.
    pub fn with_lifetime(lifetime: Duration) -> Result<Self, CacheError> {
        let cache = Self::new();
        cache.set_lifetime(lifetime)?;
        Ok(cache)
    }

    /// Upsert clients by id. Within one call the last duplicate wins.
    pub fn save(&self, clients: impl IntoIterator<Item = ApiClient>) {
        let mut map = self.clients.write().unwrap_or_else(PoisonError::into_inner);
        for client in clients {
            map.insert(cache_key(client.client_id()), client);
        }
    }

    /// Look up a client, ignoring case.
    pub fn get(&self, client_id: &str) -> Option<ApiClient> {
        let map = self.clients.read().unwrap_or_else(PoisonError::into_inner);
        map.get(&cache_key(client_id)).cloned()
    }

    /// Snapshot of all cached clients, in no particular order.
    pub fn get_all(&self) -> Vec<ApiClient> {
        let map = self.clients.read().unwrap_or_else(PoisonError::into_inner);
        map.values().cloned().collect()
    }

    /// Remove every entry. Returns the number of clients evicted.
    pub fn clear(&self) -> usize {
        clear_map(&self.clients)
    }

    pub fn len(&self) -> usize {
        self.clients
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current expiry interval (`Duration::ZERO` when disabled).
    pub fn lifetime(&self) -> Duration {
        *self.lifetime.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the expiry interval.
    ///
    /// Any running timer is cancelled. A positive lifetime starts a new one
    /// whose first clear happens one full interval from now.
    pub fn set_lifetime(&self, lifetime: Duration) -> Result<(), CacheError> {
        let runtime = if lifetime.is_zero() {
            None
        } else {
            Some(tokio::runtime::Handle::try_current().map_err(|_| CacheError::NoRuntime)?)
        };

        let mut expiry = self.expiry.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(token) = expiry.take() {
            token.cancel();
        }
        *self.lifetime.lock().unwrap_or_else(PoisonError::into_inner) = lifetime;

        if let Some(runtime) = runtime {
            let token = CancellationToken::new();
            runtime.spawn(expire_periodically(
                Arc::clone(&self.clients),
                self.events.clone(),
                Instant::now() + lifetime,
                lifetime,
                token.clone(),
            ));
            *expiry = Some(token);
        }

        Ok(())
    }

    /// Subscribe to expiry notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<CacheCleared> {
        self.events.subscribe()
    }
}

impl Drop for ApiClientCache {
    fn drop(&mut self) {
        let expiry = self.expiry.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(token) = expiry.take() {
            token.cancel();
        }
    }
}

fn cache_key(client_id: &str) -> String {
    client_id.to_lowercase()
}

fn clear_map(clients: &RwLock<ClientMap>) -> usize {
    let mut map = clients.write().unwrap_or_else(PoisonError::into_inner);
    let evicted = map.len();
    map.clear();
    evicted
}

async fn expire_periodically(
    clients: Arc<RwLock<ClientMap>>,
    events: broadcast::Sender<CacheCleared>,
    first_clear: Instant,
    lifetime: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval_at(first_clear, lifetime);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => return,
            _ = ticker.tick() => {
                let evicted = clear_map(&clients);
                debug!(evicted, lifetime_ms = lifetime.as_millis() as u64, "API client cache expired");
                // No subscribers is fine
                let _ = events.send(CacheCleared { evicted });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    fn client(id: &str, key: &str) -> ApiClient {
        ApiClient::new(id, key, [])
    }

    #[test]
    fn save_and_get_ignore_case() {
        let cache = ApiClientCache::new();
        cache.save([client("Acme", "k1")]);

        assert_eq!(cache.get("acme").unwrap().api_key(), "k1");
        assert_eq!(cache.get("ACME").unwrap().client_id(), "Acme");
        assert!(cache.get("other").is_none());
    }

    #[test]
    fn save_is_last_write_wins() {
        let cache = ApiClientCache::new();
        cache.save([client("acme", "first"), client("ACME", "second")]);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("acme").unwrap().api_key(), "second");

        cache.save([client("acme", "third")]);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("acme").unwrap().api_key(), "third");
    }

    #[test]
    fn get_all_and_clear() {
        let cache = ApiClientCache::new();
        cache.save([client("a", "1"), client("b", "2")]);
        assert_eq!(cache.get_all().len(), 2);

        assert_eq!(cache.clear(), 2);
        assert!(cache.is_empty());
        assert!(cache.get_all().is_empty());
    }

    #[test]
    fn zero_lifetime_needs_no_runtime() {
        let cache = ApiClientCache::with_lifetime(Duration::ZERO).unwrap();
        assert_eq!(cache.lifetime(), Duration::ZERO);
    }

    #[test]
    fn positive_lifetime_outside_runtime_fails() {
        let result = ApiClientCache::with_lifetime(Duration::from_secs(1));
        assert!(matches!(result, Err(CacheError::NoRuntime)));
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_clears_once_per_interval() {
        let lifetime = Duration::from_secs(60);
        let cache = ApiClientCache::with_lifetime(lifetime).unwrap();
        let mut events = cache.subscribe();
        let start = Instant::now();

        cache.save([client("a", "1"), client("b", "2")]);
        let first = events.recv().await.unwrap();
        assert_eq!(first, CacheCleared { evicted: 2 });
        assert_eq!(start.elapsed(), lifetime);
        assert!(cache.is_empty());

        cache.save([client("c", "3")]);
        let second = events.recv().await.unwrap();
        assert_eq!(second, CacheCleared { evicted: 1 });
        assert_eq!(start.elapsed(), lifetime * 2);
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test(start_paused = true)]
    async fn entries_survive_until_interval_elapses() {
        let lifetime = Duration::from_secs(60);
        let cache = ApiClientCache::with_lifetime(lifetime).unwrap();
        cache.save([client("a", "1")]);

        tokio::time::sleep(lifetime / 2).await;
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_lifetime_stops_expiry() {
        let lifetime = Duration::from_secs(60);
        let cache = ApiClientCache::with_lifetime(lifetime).unwrap();
        let mut events = cache.subscribe();

        cache.set_lifetime(Duration::ZERO).unwrap();
        cache.save([client("a", "1")]);

        tokio::time::sleep(lifetime * 5).await;
        assert_eq!(cache.len(), 1);
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test(start_paused = true)]
    async fn replacing_lifetime_restarts_timer() {
        let cache = ApiClientCache::with_lifetime(Duration::from_secs(60)).unwrap();
        let mut events = cache.subscribe();

        tokio::time::sleep(Duration::from_secs(30)).await;
        cache.set_lifetime(Duration::from_secs(100)).unwrap();
        let start = Instant::now();
        cache.save([client("a", "1")]);

        events.recv().await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(100));
        assert_eq!(cache.lifetime(), Duration::from_secs(100));
    }

    #[tokio::test(start_paused = true)]
    async fn drop_stops_timer() {
        let cache = ApiClientCache::with_lifetime(Duration::from_secs(60)).unwrap();
        let mut events = cache.subscribe();
        drop(cache);

        // Sender is gone once the task exits
        let result = events.recv().await;
        assert!(matches!(
            result,
            Err(broadcast::error::RecvError::Closed)
        ));
    }
}
