// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! API client guard middleware for Axum.
//!
//! Protects a router subtree so it can only be called by clients presenting
//! a valid `X-{ClientId}-ApiKey` header. On success the resolved
//! [`ApiClient`] is inserted into the request extensions, where handlers pick
//! it up through [`CurrentClient`](super::CurrentClient).
//!
//! ```rust,ignore
//! let guard = ApiClientGuard::new(manager).allow(["billing"]);
//!
//! let app = Router::new()
//!     .route("/protected", get(protected_handler))
//!     .layer(axum::middleware::from_fn_with_state(guard, require_api_client));
//! ```
//!
//! Every rejection is the same bare `401 Unauthorized`, whether the header
//! was missing, the client is not allowed on the route, the key was wrong or
//! the client source failed.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, error, warn};

use super::client::ApiClient;
use super::credentials::ApiKeyHeaderPattern;
use super::error::{ClientError, GuardError};
use super::manager::ApiClientManager;

/// Guard configuration: the client manager, the header template and an
/// optional allow-list of client ids.
#[derive(Clone)]
pub struct ApiClientGuard {
    manager: Arc<dyn ApiClientManager>,
    pattern: Arc<ApiKeyHeaderPattern>,
    /// Lowercased; empty admits any valid client
    allowed: Arc<[String]>,
}

impl ApiClientGuard {
    /// Guard admitting any client the manager validates.
    pub fn new(manager: Arc<dyn ApiClientManager>) -> Self {
        Self {
            manager,
            pattern: Arc::new(ApiKeyHeaderPattern::default()),
            allowed: Arc::from(Vec::new()),
        }
    }

    /// Restrict the guard to the given client ids (case-insensitive).
    pub fn allow<I, T>(mut self, clients: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.allowed = clients
            .into_iter()
            .map(|id| id.as_ref().to_lowercase())
            .collect();
        self
    }

    pub fn with_header_pattern(mut self, pattern: ApiKeyHeaderPattern) -> Self {
        self.pattern = Arc::new(pattern);
        self
    }

    pub fn manager(&self) -> &Arc<dyn ApiClientManager> {
        &self.manager
    }

    pub fn header_pattern(&self) -> &ApiKeyHeaderPattern {
        &self.pattern
    }

    /// Whether `client_id` passes the allow-list.
    pub fn is_allowed(&self, client_id: &str) -> bool {
        if self.allowed.is_empty() {
            return true;
        }
        let client_id = client_id.to_lowercase();
        self.allowed.iter().any(|id| *id == client_id)
    }

    /// Run extraction, the allow-list check and validation.
    pub async fn authorize(&self, headers: &HeaderMap) -> Result<ApiClient, GuardError> {
        let credentials = self
            .pattern
            .extract(headers)
            .ok_or(GuardError::CredentialsAbsent)?;

        if !self.is_allowed(&credentials.client_id) {
            return Err(GuardError::ClientNotAllowed(credentials.client_id));
        }

        match self
            .manager
            .validate(&credentials.client_id, &credentials.api_key)
            .await
        {
            Ok(client) => Ok(client),
            Err(ClientError::AuthenticationFailed) => {
                Err(GuardError::AuthenticationFailed(credentials.client_id))
            }
            Err(source) => Err(GuardError::DependencyUnavailable {
                client_id: credentials.client_id,
                source,
            }),
        }
    }
}

/// Middleware rejecting requests without a valid API client.
pub async fn require_api_client(
    State(guard): State<ApiClientGuard>,
    mut request: Request,
    next: Next,
) -> Response {
    match guard.authorize(request.headers()).await {
        Ok(client) => {
            debug!(client_id = %client.client_id(), "API client authorized");
            request.extensions_mut().insert(client);
            next.run(request).await
        }
        Err(e) => {
            log_rejection(&e);
            e.into_response()
        }
    }
}

fn log_rejection(error: &GuardError) {
    match error {
        GuardError::CredentialsAbsent => {
            debug!(error_code = error.error_code(), "Request without API key credentials");
        }
        GuardError::ClientNotAllowed(client_id) => {
            debug!(
                client_id = %client_id,
                error_code = error.error_code(),
                "API client not allowed on this route"
            );
        }
        GuardError::AuthenticationFailed(client_id) => {
            warn!(client_id = %client_id, "Invalid API key for client");
        }
        GuardError::DependencyUnavailable { client_id, source } => {
            error!(
                client_id = %client_id,
                error = %source,
                "Could not validate API client"
            );
        }
    }
}
