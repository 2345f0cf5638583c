use axum::{Json, extract::State};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub environment: String,
    pub database: String,
}

/// `GET /api/health`. Always 200; the database field reports reachability.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = if state.db.ping().await {
        "Connected"
    } else {
        "Disconnected"
    };

    Json(HealthResponse {
        status: "OK".into(),
        timestamp: Utc::now().to_rfc3339(),
        environment: state.environment.clone(),
        database: database.into(),
    })
}
