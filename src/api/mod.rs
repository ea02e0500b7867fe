// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{middleware, routing::get, Router};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{require_api_client, ApiKeyHeaders, Claim, ClientSummary},
    state::AppState,
};

pub mod clients;
pub mod health;

pub fn router(state: AppState) -> Router {
    let mut v1_routes = Router::new()
        .route("/client", get(clients::current_client))
        .route_layer(middleware::from_fn_with_state(
            state.client_guard.clone(),
            require_api_client,
        ));

    if let Some(admin_guard) = state.admin_guard.clone() {
        let admin_routes = Router::new()
            .route("/clients", get(clients::list_clients))
            .route("/clients/{client_id}", get(clients::get_client))
            .route_layer(middleware::from_fn_with_state(admin_guard, require_api_client));
        v1_routes = v1_routes.merge(admin_routes);
    }

    let v1_routes = v1_routes.with_state(state.clone());

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .with_state(state.clone())
        .nest("/v1", v1_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", api_doc(&state)))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

/// OpenAPI document with the API key header of every documented client.
pub fn api_doc(state: &AppState) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    ApiKeyHeaders::new(
        state.client_guard.header_pattern(),
        state.documented_clients.iter(),
    )
    .modify(&mut doc);
    doc
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        clients::current_client,
        clients::list_clients,
        clients::get_client
    ),
    components(
        schemas(
            ClientSummary,
            Claim,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Clients", description = "API client identity and directory")
    )
)]
struct ApiDoc;
