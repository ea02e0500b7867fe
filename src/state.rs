// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{ApiClientGuard, ApiClientManager, ApiKeyHeaderPattern, InMemoryApiClientManager};
use crate::config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<dyn ApiClientManager>,
    /// Admits any valid client
    pub client_guard: ApiClientGuard,
    /// Admits only the configured admin clients. Admin routes are not
    /// mounted when unset.
    pub admin_guard: Option<ApiClientGuard>,
    /// Client ids listed in the OpenAPI document
    pub documented_clients: Arc<[String]>,
}

impl AppState {
    pub fn new(manager: Arc<dyn ApiClientManager>) -> Self {
        Self {
            client_guard: ApiClientGuard::new(Arc::clone(&manager)),
            admin_guard: None,
            manager,
            documented_clients: Arc::from(Vec::new()),
        }
    }

    /// Build the state from the server configuration with a static client list.
    pub fn from_config(config: &ServerConfig) -> Self {
        let manager = InMemoryApiClientManager::new(config.clients.iter().cloned())
            .with_key_decoding(config.key_decoding);
        let ids = config
            .clients
            .iter()
            .map(|c| c.client_id().to_string())
            .collect();

        Self::new(Arc::new(manager))
            .with_admin_clients(&config.admin_clients)
            .with_header_pattern(config.header_pattern.clone())
            .with_documented_clients(ids)
    }

    pub fn with_header_pattern(mut self, pattern: ApiKeyHeaderPattern) -> Self {
        self.client_guard = self.client_guard.with_header_pattern(pattern.clone());
        self.admin_guard = self
            .admin_guard
            .map(|guard| guard.with_header_pattern(pattern));
        self
    }

    /// Enable the admin routes for the given clients. An empty list leaves
    /// them disabled.
    pub fn with_admin_clients<T: AsRef<str>>(mut self, clients: &[T]) -> Self {
        self.admin_guard = if clients.is_empty() {
            None
        } else {
            Some(
                ApiClientGuard::new(Arc::clone(&self.manager))
                    .with_header_pattern(self.client_guard.header_pattern().clone())
                    .allow(clients),
            )
        };
        self
    }

    pub fn with_documented_clients(mut self, clients: Vec<String>) -> Self {
        self.documented_clients = Arc::from(clients);
        self
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Arc::new(InMemoryApiClientManager::new([])))
    }
}
