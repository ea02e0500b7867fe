// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! API Client Guard - API key authentication for Axum services
//!
//! This crate authenticates callers that present a per-client API key in a
//! header named after the client (`X-{ClientId}-ApiKey` by default), and
//! ships a small HTTP service exposing the authenticated identity.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - API clients, client managers, credential extraction and the access guard
//! - `config` - Environment configuration
//! - `state` - Shared application state

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod state;
