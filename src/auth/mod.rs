// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Client Authentication
//!
//! Authenticates external applications ("API clients") by a client id and an
//! API key carried in a single `X-{ClientId}-ApiKey` request header.
//!
//! ## Flow
//!
//! 1. [`require_api_client`] extracts the credentials with
//!    [`ApiKeyHeaderPattern`]
//! 2. The guard's optional allow-list is checked
//! 3. The [`ApiClientManager`] validates the pair, hydrating its
//!    [`ApiClientCache`] from an [`ApiClientSource`] on a miss if it is a
//!    [`PersistentApiClientManager`]
//! 4. The resolved [`ApiClient`] is stored in the request extensions and read
//!    by handlers through [`CurrentClient`]
//!
//! ## Security
//!
//! - Unknown clients and wrong keys are indistinguishable to callers
//! - Every rejection is a bare `401` with no body
//! - API keys are never logged, serialized or printed by `Debug`

pub mod cache;
pub mod client;
pub mod credentials;
pub mod docs;
pub mod error;
pub mod extractor;
pub mod manager;
pub mod middleware;
pub mod persistent;

pub use cache::{ApiClientCache, CacheCleared};
pub use client::{ApiClient, Claim, ClientSummary};
pub use credentials::{ApiKeyCredentials, ApiKeyHeaderPattern, DEFAULT_API_KEY_HEADER};
pub use docs::ApiKeyHeaders;
pub use error::{BoxError, CacheError, ClientError, GuardError, PatternError};
pub use extractor::CurrentClient;
pub use manager::{ApiClientManager, InMemoryApiClientManager, KeyDecoding};
pub use middleware::{require_api_client, ApiClientGuard};
pub use persistent::{ApiClientSource, PersistentApiClientManager};
