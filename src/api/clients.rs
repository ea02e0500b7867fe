// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    auth::{ClientSummary, CurrentClient},
    error::ApiError,
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/v1/client",
    tag = "Clients",
    responses(
        (status = 200, description = "The calling client", body = ClientSummary),
        (status = 401, description = "Missing or invalid API key")
    )
)]
pub async fn current_client(CurrentClient(client): CurrentClient) -> Json<ClientSummary> {
    Json(ClientSummary::from(&client))
}

#[utoipa::path(
    get,
    path = "/v1/clients",
    tag = "Clients",
    responses(
        (status = 200, description = "Clients currently known to the server", body = [ClientSummary]),
        (status = 401, description = "Missing or invalid API key, or not an admin client"),
        (status = 503, description = "Client directory unavailable")
    )
)]
pub async fn list_clients(State(state): State<AppState>) -> Result<Json<Vec<ClientSummary>>, ApiError> {
    let mut clients: Vec<ClientSummary> = state
        .manager
        .get_clients()
        .await?
        .iter()
        .map(ClientSummary::from)
        .collect();
    clients.sort_by(|a, b| a.client_id.cmp(&b.client_id));
    Ok(Json(clients))
}

#[utoipa::path(
    get,
    path = "/v1/clients/{client_id}",
    params(
        ("client_id" = String, Path, description = "Identifier of the client (case-insensitive)")
    ),
    tag = "Clients",
    responses(
        (status = 200, description = "The requested client", body = ClientSummary),
        (status = 401, description = "Missing or invalid API key, or not an admin client"),
        (status = 404, description = "Unknown client"),
        (status = 503, description = "Client directory unavailable")
    )
)]
pub async fn get_client(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
) -> Result<Json<ClientSummary>, ApiError> {
    let client = state
        .manager
        .get_client(&client_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Client not found"))?;
    Ok(Json(ClientSummary::from(&client)))
}
