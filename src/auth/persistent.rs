// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Client manager backed by an external source with a local cache.
//!
//! The source (database, remote service, ...) is only consulted on a cache
//! miss. Found clients are saved in the cache until it expires or is
//! flushed. Concurrent misses for the same id may each reach the source;
//! saving is idempotent so the result is the same.
//!
//! Dropping the future returned by [`ApiClientManager::get_client`] drops the
//! in-flight source call, so cancelling the inbound request cancels the
//! fetch too.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::cache::ApiClientCache;
use super::client::ApiClient;
use super::error::{BoxError, CacheError, ClientError};
use super::manager::{ApiClientManager, KeyDecoding};

/// External store of API clients.
#[async_trait]
pub trait ApiClientSource: Send + Sync {
    /// Load one client by id. Unknown ids are `Ok(None)`.
    async fn fetch_client(&self, client_id: &str) -> Result<Option<ApiClient>, BoxError>;
}

/// [`ApiClientManager`] that hydrates its cache from an [`ApiClientSource`].
pub struct PersistentApiClientManager<S> {
    source: S,
    cache: ApiClientCache,
    key_decoding: KeyDecoding,
    fetch_timeout: Option<Duration>,
}

impl<S: ApiClientSource> PersistentApiClientManager<S> {
    /// Manager whose cache never expires.
    pub fn new(source: S) -> Self {
        Self {
            source,
            cache: ApiClientCache::new(),
            key_decoding: KeyDecoding::Plain,
            fetch_timeout: None,
        }
    }

    /// Manager whose cache is cleared every `lifetime`.
    pub fn with_cache_lifetime(source: S, lifetime: Duration) -> Result<Self, CacheError> {
        let manager = Self::new(source);
        manager.cache.set_lifetime(lifetime)?;
        Ok(manager)
    }

    /// Seed the cache. Seeded clients are lost on the next expiry like any
    /// other entry.
    pub fn with_clients(self, clients: impl IntoIterator<Item = ApiClient>) -> Self {
        self.cache.save(clients);
        self
    }

    pub fn with_key_decoding(mut self, key_decoding: KeyDecoding) -> Self {
        self.key_decoding = key_decoding;
        self
    }

    /// Give up on source calls that take longer than `timeout`.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// The underlying cache, for manual flushes and expiry subscriptions.
    pub fn cache(&self) -> &ApiClientCache {
        &self.cache
    }

    async fn fetch(&self, client_id: &str) -> Result<Option<ApiClient>, ClientError> {
        let fetch = self.source.fetch_client(client_id);
        let result = match self.fetch_timeout {
            Some(timeout) => tokio::time::timeout(timeout, fetch)
                .await
                .map_err(|_| ClientError::Timeout(timeout))?,
            None => fetch.await,
        };
        result.map_err(ClientError::SourceUnavailable)
    }
}

#[async_trait]
impl<S: ApiClientSource> ApiClientManager for PersistentApiClientManager<S> {
    async fn get_client(&self, client_id: &str) -> Result<Option<ApiClient>, ClientError> {
        if let Some(client) = self.cache.get(client_id) {
            return Ok(Some(client));
        }

        match self.fetch(client_id).await? {
            Some(client) if client.is(client_id) => {
                debug!(client_id = %client.client_id(), "API client loaded from source");
                self.cache.save([client.clone()]);
                Ok(Some(client))
            }
            Some(client) => {
                warn!(
                    client_id,
                    returned = %client.client_id(),
                    "Client source returned a different client, ignoring it"
                );
                Ok(None)
            }
            None => {
                debug!(client_id, "API client not found in source");
                Ok(None)
            }
        }
    }

    async fn get_clients(&self) -> Result<Vec<ApiClient>, ClientError> {
        Ok(self.cache.get_all())
    }

    fn key_decoding(&self) -> KeyDecoding {
        self.key_decoding
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Source over a fixed map that counts its calls.
    #[derive(Default)]
    struct CountingSource {
        clients: HashMap<String, ApiClient>,
        calls: Arc<AtomicUsize>,
        delay: Option<Duration>,
        fail: bool,
    }

    impl CountingSource {
        fn with(clients: &[(&str, &str)]) -> Self {
            Self {
                clients: clients
                    .iter()
                    .map(|(id, key)| (id.to_lowercase(), ApiClient::new(*id, *key, [])))
                    .collect(),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl ApiClientSource for CountingSource {
        async fn fetch_client(&self, client_id: &str) -> Result<Option<ApiClient>, BoxError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err("connection refused".into());
            }
            Ok(self.clients.get(&client_id.to_lowercase()).cloned())
        }
    }

    #[tokio::test]
    async fn miss_fetches_once_then_hits_cache() {
        let source = CountingSource::with(&[("x", "k")]);
        let calls = Arc::clone(&source.calls);
        let manager = PersistentApiClientManager::new(source);

        assert!(manager.get_client("x").await.unwrap().is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert!(manager.get_client("X").await.unwrap().is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(manager.get_clients().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_client_is_not_cached() {
        let source = CountingSource::with(&[]);
        let calls = Arc::clone(&source.calls);
        let manager = PersistentApiClientManager::new(source);

        assert!(manager.get_client("ghost").await.unwrap().is_none());
        assert!(manager.get_client("ghost").await.unwrap().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(manager.cache().is_empty());
    }

    #[tokio::test]
    async fn get_clients_never_enumerates_source() {
        let source = CountingSource::with(&[("a", "1"), ("b", "2")]);
        let calls = Arc::clone(&source.calls);
        let manager = PersistentApiClientManager::new(source);

        assert!(manager.get_clients().await.unwrap().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn validate_through_source() {
        let manager = PersistentApiClientManager::new(CountingSource::with(&[("acme", "secret")]));
        assert!(manager.validate("ACME", "secret").await.is_ok());
        assert!(matches!(
            manager.validate("acme", "Secret").await,
            Err(ClientError::AuthenticationFailed)
        ));
        assert!(matches!(
            manager.validate("nobody", "secret").await,
            Err(ClientError::AuthenticationFailed)
        ));
    }

    #[tokio::test]
    async fn seeded_clients_skip_the_source() {
        let source = CountingSource::with(&[]);
        let calls = Arc::clone(&source.calls);
        let manager = PersistentApiClientManager::new(source)
            .with_clients([ApiClient::new("seed", "k", [])]);

        assert!(manager.is_valid("seed", "k").await.unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn source_failure_is_not_an_authentication_failure() {
        let source = CountingSource {
            fail: true,
            ..CountingSource::with(&[("acme", "secret")])
        };
        let manager = PersistentApiClientManager::new(source);

        assert!(matches!(
            manager.validate("acme", "secret").await,
            Err(ClientError::SourceUnavailable(_))
        ));
        assert!(manager.is_valid("acme", "secret").await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_source_times_out() {
        let source = CountingSource {
            delay: Some(Duration::from_secs(30)),
            ..CountingSource::with(&[("acme", "secret")])
        };
        let manager =
            PersistentApiClientManager::new(source).with_fetch_timeout(Duration::from_secs(5));

        assert!(matches!(
            manager.get_client("acme").await,
            Err(ClientError::Timeout(d)) if d == Duration::from_secs(5)
        ));
        assert!(manager.cache().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_forces_refetch() {
        let source = CountingSource::with(&[("x", "k")]);
        let calls = Arc::clone(&source.calls);
        let manager =
            PersistentApiClientManager::with_cache_lifetime(source, Duration::from_secs(60))
                .unwrap();
        let mut events = manager.cache().subscribe();

        manager.get_client("x").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        events.recv().await.unwrap();
        manager.get_client("x").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn base64_policy_applies_to_fetched_clients() {
        let manager = PersistentApiClientManager::new(CountingSource::with(&[("acme", "secret")]))
            .with_key_decoding(KeyDecoding::Base64);
        assert!(manager.is_valid("acme", "c2VjcmV0").await.unwrap());
        assert!(!manager.is_valid("acme", "secret").await.unwrap());
    }

    /// Source that answers every lookup with the same client.
    struct FixedSource(ApiClient);

    #[async_trait]
    impl ApiClientSource for FixedSource {
        async fn fetch_client(&self, _client_id: &str) -> Result<Option<ApiClient>, BoxError> {
            Ok(Some(self.0.clone()))
        }
    }

    #[tokio::test]
    async fn mismatched_client_from_source_is_rejected() {
        let manager = PersistentApiClientManager::new(FixedSource(ApiClient::new("root", "k", [])));

        assert!(manager.get_client("guest").await.unwrap().is_none());
        assert!(manager.cache().is_empty());
        assert!(matches!(
            manager.validate("guest", "k").await,
            Err(ClientError::AuthenticationFailed)
        ));

        let root = manager.validate("ROOT", "k").await.unwrap();
        assert_eq!(root.client_id(), "root");
    }
}
