// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! OpenAPI documentation of the API key headers.
//!
//! Adds one optional `X-{ClientId}-ApiKey` header parameter per known client
//! to every documented operation, so Swagger UI offers a field for each.

use utoipa::openapi::path::{Operation, Parameter, ParameterBuilder, ParameterIn};
use utoipa::openapi::schema::{ObjectBuilder, Type};
use utoipa::openapi::{OpenApi, Required};
use utoipa::Modify;

use super::credentials::ApiKeyHeaderPattern;

/// `utoipa` modifier listing the API key header of every client.
pub struct ApiKeyHeaders {
    header_names: Vec<String>,
}

impl ApiKeyHeaders {
    pub fn new<I, T>(pattern: &ApiKeyHeaderPattern, client_ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut header_names: Vec<String> = client_ids
            .into_iter()
            .map(|id| pattern.header_name(id.as_ref()))
            .collect();
        header_names.sort();
        header_names.dedup();
        Self { header_names }
    }

    fn parameter(name: &str) -> Parameter {
        ParameterBuilder::new()
            .name(name)
            .parameter_in(ParameterIn::Header)
            .required(Required::False)
            .description(Some("API key of the calling client"))
            .schema(Some(ObjectBuilder::new().schema_type(Type::String)))
            .build()
    }

    fn apply(&self, operation: &mut Operation) {
        let parameters = operation.parameters.get_or_insert_with(Vec::new);
        for name in &self.header_names {
            let already_documented = parameters
                .iter()
                .any(|p| p.parameter_in == ParameterIn::Header && p.name.eq_ignore_ascii_case(name));
            if !already_documented {
                parameters.push(Self::parameter(name));
            }
        }
    }
}

impl Modify for ApiKeyHeaders {
    fn modify(&self, openapi: &mut OpenApi) {
        if self.header_names.is_empty() {
            return;
        }

        for item in openapi.paths.paths.values_mut() {
            let operations = [
                &mut item.get,
                &mut item.put,
                &mut item.post,
                &mut item.delete,
                &mut item.options,
                &mut item.head,
                &mut item.patch,
                &mut item.trace,
            ];
            for operation in operations.into_iter().flatten() {
                self.apply(operation);
            }
        }
    }
}
