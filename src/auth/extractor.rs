// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for the API client bound to the current request.
//!
//! The guard middleware stores the validated [`ApiClient`] in the request
//! extensions. Handlers read it back with:
//!
//! ```rust,ignore
//! async fn my_handler(CurrentClient(client): CurrentClient) -> impl IntoResponse {
//!     // client is the validated ApiClient, or ApiClient::anonymous()
//! }
//! ```

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use super::client::ApiClient;

/// The client resolved for this request.
///
/// Falls back to [`ApiClient::anonymous`] on routes that are not guarded, so
/// extraction never fails.
#[derive(Debug, Clone)]
pub struct CurrentClient(pub ApiClient);

impl<S> FromRequestParts<S> for CurrentClient
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let client = parts
            .extensions
            .get::<ApiClient>()
            .cloned()
            .unwrap_or_else(ApiClient::anonymous);
        Ok(CurrentClient(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[tokio::test]
    async fn defaults_to_anonymous() {
        let mut parts = Request::builder()
            .uri("/test")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let CurrentClient(client) = CurrentClient::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(client.is_anonymous());
    }

    #[tokio::test]
    async fn reads_client_from_extensions() {
        let mut parts = Request::builder()
            .uri("/test")
            .body(())
            .unwrap()
            .into_parts()
            .0;
        parts
            .extensions
            .insert(ApiClient::new("acme", "secret", []));

        let CurrentClient(client) = CurrentClient::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(client.client_id(), "acme");
    }
}
