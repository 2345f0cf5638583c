//! HTTP JSON API under `/api`.

pub mod auth;
pub mod error;
pub mod health;
pub mod tasks;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use taskboard_core::{Database, TokenSigner};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use auth::AuthUser;
pub use error::{ApiError, ApiErrorResponse};

/// Shared per-request dependencies.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub signer: Arc<TokenSigner>,
    pub environment: String,
}

impl AppState {
    pub fn new(db: Database, signer: TokenSigner, environment: impl Into<String>) -> Self {
        Self {
            db,
            signer: Arc::new(signer),
            environment: environment.into(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/health", get(health::health_check))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route("/tasks/stats", get(tasks::task_stats))
        .route(
            "/tasks/{id}",
            put(tasks::update_task).delete(tasks::delete_task),
        )
        .fallback(api_not_found);

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn api_not_found() -> ApiErrorResponse {
    ApiErrorResponse::not_found("API endpoint not found")
}
