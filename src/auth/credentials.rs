// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Extraction of client credentials from `X-{ClientId}-ApiKey` headers.
//!
//! The client id is part of the header *name* and the API key is the header
//! value. A request must carry exactly one such header with exactly one
//! value; anything else counts as no credentials at all.

use axum::http::HeaderMap;
use regex::{Regex, RegexBuilder};

use super::error::PatternError;

/// Placeholder replaced by the client id in header templates.
pub const CLIENT_ID_PLACEHOLDER: &str = "{ClientId}";

/// Default API key header template.
pub const DEFAULT_API_KEY_HEADER: &str = "X-{ClientId}-ApiKey";

/// Client id and API key presented by a request.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKeyCredentials {
    pub client_id: String,
    pub api_key: String,
}

impl std::fmt::Debug for ApiKeyCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyCredentials")
            .field("client_id", &self.client_id)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Compiled API key header template.
#[derive(Debug, Clone)]
pub struct ApiKeyHeaderPattern {
    template: String,
    regex: Regex,
}

impl Default for ApiKeyHeaderPattern {
    fn default() -> Self {
        Self::new(DEFAULT_API_KEY_HEADER).expect("default API key header template is valid")
    }
}

impl ApiKeyHeaderPattern {
    /// Compile a template such as `X-{ClientId}-ApiKey`.
    ///
    /// Header names are matched case-insensitively and the placeholder
    /// captures one or more characters.
    pub fn new(template: impl Into<String>) -> Result<Self, PatternError> {
        let template = template.into();
        let (prefix, suffix) = template
            .split_once(CLIENT_ID_PLACEHOLDER)
            .ok_or_else(|| PatternError::MissingPlaceholder(template.clone()))?;

        let pattern = format!("^{}(.+){}$", regex::escape(prefix), regex::escape(suffix));
        let regex = RegexBuilder::new(&pattern).case_insensitive(true).build()?;

        Ok(Self { template, regex })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Header name carrying the API key of `client_id`.
    pub fn header_name(&self, client_id: &str) -> String {
        self.template.replacen(CLIENT_ID_PLACEHOLDER, client_id, 1)
    }

    /// Pull credentials out of the request headers.
    ///
    /// Returns `None` for zero or several matching headers, several values
    /// under the matching header, an empty value, or a value that is not
    /// visible ASCII.
    pub fn extract(&self, headers: &HeaderMap) -> Option<ApiKeyCredentials> {
        let mut matching = headers
            .keys()
            .filter(|name| self.regex.is_match(name.as_str()));

        let name = matching.next()?;
        if matching.next().is_some() {
            return None;
        }

        let client_id = self
            .regex
            .captures(name.as_str())?
            .get(1)?
            .as_str()
            .to_string();

        let mut values = headers.get_all(name).iter();
        let value = values.next()?;
        if values.next().is_some() {
            return None;
        }

        let api_key = value.to_str().ok()?;
        if api_key.is_empty() {
            return None;
        }

        Some(ApiKeyCredentials {
            client_id,
            api_key: api_key.to_string(),
        })
    }
}
