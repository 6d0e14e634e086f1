//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    infrastructure::dto::http::{HealthResponse, RelayCredentialsResponse, RoomsResponse},
    ui::state::AppState,
    usecase::RelayCredentialsError,
};

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

/// Lobby view for clients that have not opened a WebSocket yet
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<RoomsResponse> {
    let rooms = state.get_rooms_usecase.execute().await;

    // Domain Model から DTO への変換
    Json(RoomsResponse {
        rooms: rooms.into_iter().map(Into::into).collect(),
    })
}

/// Time-limited relay credentials, or 204 when the relay is not configured
pub async fn get_turn_credentials(State(state): State<Arc<AppState>>) -> Response {
    match state.issue_relay_credentials_usecase.execute() {
        Ok(credentials) => Json(RelayCredentialsResponse::from(credentials)).into_response(),
        Err(RelayCredentialsError::NotConfigured) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            tracing::error!("Failed to issue relay credentials: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
