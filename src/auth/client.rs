// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! API client identity.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A single key/value attribute attached to an API client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Claim {
    /// Claim type (e.g. `scope`, `tenant`)
    #[serde(rename = "type")]
    pub claim_type: String,
    /// Claim value
    pub value: String,
}

impl Claim {
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
        }
    }
}

/// An external application or service that consumes the API.
///
/// Clients are immutable once registered. The API key is a secret: it is
/// accepted when deserializing configuration but is never serialized back
/// out and is redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiClient {
    client_id: String,
    #[serde(skip_serializing)]
    api_key: String,
    #[serde(default)]
    claims: Vec<Claim>,
}

impl ApiClient {
    pub fn new(
        client_id: impl Into<String>,
        api_key: impl Into<String>,
        claims: impl IntoIterator<Item = Claim>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            api_key: api_key.into(),
            claims: claims.into_iter().collect(),
        }
    }

    /// The identity bound to requests that carry no authenticated client.
    pub fn anonymous() -> Self {
        Self {
            client_id: String::new(),
            api_key: String::new(),
            claims: Vec::new(),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.client_id.is_empty() && self.api_key.is_empty() && self.claims.is_empty()
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    /// Returns the first claim value of the given type.
    pub fn claim(&self, claim_type: &str) -> Option<&str> {
        self.claims
            .iter()
            .find(|c| c.claim_type == claim_type)
            .map(|c| c.value.as_str())
    }

    /// Case-insensitive client id comparison.
    pub fn is(&self, client_id: &str) -> bool {
        self.client_id.to_lowercase() == client_id.to_lowercase()
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("client_id", &self.client_id)
            .field("api_key", &"<redacted>")
            .field("claims", &self.claims)
            .finish()
    }
}

/// Public view of a client, safe to return from HTTP handlers.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ClientSummary {
    /// Client identifier
    pub client_id: String,
    /// Claims attached to the client
    pub claims: Vec<Claim>,
    /// True when no client was authenticated
    pub anonymous: bool,
}

impl From<&ApiClient> for ClientSummary {
    fn from(client: &ApiClient) -> Self {
        Self {
            client_id: client.client_id.clone(),
            claims: client.claims.clone(),
            anonymous: client.is_anonymous(),
        }
    }
}
