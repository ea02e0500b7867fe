// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Client authentication errors.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Boxed error returned by external client sources.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by an [`ApiClientManager`](super::ApiClientManager).
#[derive(Debug, Error)]
pub enum ClientError {
    /// Unknown client id or API key mismatch. Both collapse into one variant
    /// so callers cannot tell which part was wrong.
    #[error("Invalid client id or API key")]
    AuthenticationFailed,
    /// The external client source failed
    #[error("Client source unavailable: {0}")]
    SourceUnavailable(#[source] BoxError),
    /// The external client source did not answer in time
    #[error("Client source timed out after {0:?}")]
    Timeout(Duration),
}

/// Errors raised when configuring an [`ApiClientCache`](super::ApiClientCache).
#[derive(Debug, Error)]
pub enum CacheError {
    /// Expiry needs a Tokio runtime to schedule its timer
    #[error("Cache expiry requires a running Tokio runtime")]
    NoRuntime,
}

/// Errors raised when compiling an API key header template.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("Header template {0:?} does not contain the {{ClientId}} placeholder")]
    MissingPlaceholder(String),
    #[error("Invalid header template: {0}")]
    Regex(#[from] regex::Error),
}

/// Rejection reasons of the API client guard.
///
/// Every variant renders as the same bare `401 Unauthorized` response so
/// callers cannot probe which check failed.
#[derive(Debug, Error)]
pub enum GuardError {
    /// No single well-formed API key header on the request
    #[error("API key credentials are missing")]
    CredentialsAbsent,
    /// Client is not in the allow-list of the protected route
    #[error("Client {0} is not allowed on this route")]
    ClientNotAllowed(String),
    /// Unknown client or wrong key
    #[error("Invalid API key for client {0}")]
    AuthenticationFailed(String),
    /// The client manager or its source failed
    #[error("Client manager unavailable while authenticating {client_id}: {source}")]
    DependencyUnavailable {
        client_id: String,
        #[source]
        source: ClientError,
    },
}

impl GuardError {
    /// Get the error code for this error (server-side diagnostics only).
    pub fn error_code(&self) -> &'static str {
        match self {
            GuardError::CredentialsAbsent => "credentials_absent",
            GuardError::ClientNotAllowed(_) => "client_not_allowed",
            GuardError::AuthenticationFailed(_) => "authentication_failed",
            GuardError::DependencyUnavailable { .. } => "dependency_unavailable",
        }
    }
}

impl IntoResponse for GuardError {
    fn into_response(self) -> Response {
        StatusCode::UNAUTHORIZED.into_response()
    }
}
