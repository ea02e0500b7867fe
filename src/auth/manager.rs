// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Client managers: lookup and API key validation.

use std::str::FromStr;

use async_trait::async_trait;
use base64ct::{Base64, Encoding};

use super::cache::ApiClientCache;
use super::client::ApiClient;
use super::error::ClientError;

/// How the presented API key is transformed before comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyDecoding {
    /// Compare the header value as-is
    #[default]
    Plain,
    /// The header value is standard padded base64 of the stored key
    Base64,
}

impl KeyDecoding {
    /// Decode a presented key. `None` means it cannot match any client.
    pub fn decode(self, presented: &str) -> Option<String> {
        match self {
            KeyDecoding::Plain => Some(presented.to_string()),
            KeyDecoding::Base64 => {
                let bytes = Base64::decode_vec(presented).ok()?;
                String::from_utf8(bytes).ok()
            }
        }
    }
}

impl FromStr for KeyDecoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plain" | "none" => Ok(KeyDecoding::Plain),
            "base64" => Ok(KeyDecoding::Base64),
            other => Err(format!("unknown API key decoding {other:?} (expected plain or base64)")),
        }
    }
}

/// Resolves and validates API clients.
///
/// Implementations are shared by every in-flight request and must be safe
/// to call concurrently.
#[async_trait]
pub trait ApiClientManager: Send + Sync {
    /// Look up a client by id (case-insensitive). Unknown ids are `Ok(None)`.
    async fn get_client(&self, client_id: &str) -> Result<Option<ApiClient>, ClientError>;

    /// All clients currently known to this manager.
    async fn get_clients(&self) -> Result<Vec<ApiClient>, ClientError>;

    /// Decoding applied to presented keys before comparison.
    fn key_decoding(&self) -> KeyDecoding {
        KeyDecoding::Plain
    }

    /// Resolve the client and check its key.
    ///
    /// Unknown clients, wrong keys and a resolved client with a different id
    /// all fail with [`ClientError::AuthenticationFailed`].
    async fn validate(&self, client_id: &str, api_key: &str) -> Result<ApiClient, ClientError> {
        let client = self
            .get_client(client_id)
            .await?
            .filter(|client| client.is(client_id))
            .ok_or(ClientError::AuthenticationFailed)?;

        let presented = self
            .key_decoding()
            .decode(api_key)
            .ok_or(ClientError::AuthenticationFailed)?;

        if client.api_key() != presented {
            return Err(ClientError::AuthenticationFailed);
        }

        Ok(client)
    }

    /// `validate` as a boolean. Only authentication failures map to `false`.
    async fn is_valid(&self, client_id: &str, api_key: &str) -> Result<bool, ClientError> {
        match self.validate(client_id, api_key).await {
            Ok(_) => Ok(true),
            Err(ClientError::AuthenticationFailed) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Manager over a fixed, preloaded set of clients. Never fetches.
pub struct InMemoryApiClientManager {
    cache: ApiClientCache,
    key_decoding: KeyDecoding,
}

impl InMemoryApiClientManager {
    pub fn new(clients: impl IntoIterator<Item = ApiClient>) -> Self {
        let cache = ApiClientCache::new();
        cache.save(clients);
        Self {
            cache,
            key_decoding: KeyDecoding::Plain,
        }
    }

    pub fn with_key_decoding(mut self, key_decoding: KeyDecoding) -> Self {
        self.key_decoding = key_decoding;
        self
    }

    /// Registered client ids.
    pub fn client_ids(&self) -> Vec<String> {
        self.cache
            .get_all()
            .into_iter()
            .map(|c| c.client_id().to_string())
            .collect()
    }
}

#[async_trait]
impl ApiClientManager for InMemoryApiClientManager {
    async fn get_client(&self, client_id: &str) -> Result<Option<ApiClient>, ClientError> {
        Ok(self.cache.get(client_id))
    }

    async fn get_clients(&self) -> Result<Vec<ApiClient>, ClientError> {
        Ok(self.cache.get_all())
    }

    fn key_decoding(&self) -> KeyDecoding {
        self.key_decoding
    }
}
