//! Signup, login and the bearer-token gate for protected routes.

use axum::{
    Json,
    extract::{FromRef, FromRequestParts, State, rejection::JsonRejection},
    http::{StatusCode, header, request::Parts},
};
use serde::{Deserialize, Serialize};
use taskboard_core::validation::{validate_login, validate_signup};
use taskboard_core::{Identity, LoginInput, PublicUser, SignupInput};

use super::AppState;
use super::error::ApiErrorResponse;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: PublicUser,
}

/// The verified caller of a protected route.
///
/// Extraction fails with 401 when the `Authorization` header is missing,
/// malformed, or carries a token that does not verify.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiErrorResponse;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        let identity = state.signer.verify_header(header)?;
        Ok(AuthUser(identity))
    }
}

/// `POST /api/auth/signup`
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupInput>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiErrorResponse> {
    let Json(input) = payload?;
    let new_user = validate_signup(&input)?;
    let user = state.db.create_user(&new_user).await?;
    let token = state.signer.issue(&user)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User created successfully".into(),
            token,
            user: user.into(),
        }),
    ))
}

/// `POST /api/auth/login`, accepting a username or an email as `username`.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginInput>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiErrorResponse> {
    let Json(input) = payload?;
    let (login, password) = validate_login(&input)?;
    let user = state.db.authenticate(&login, &password).await.inspect_err(|_| {
        tracing::info!(login = %login, "failed login attempt");
    })?;
    let token = state.signer.issue(&user)?;

    Ok(Json(AuthResponse {
        message: "Login successful".into(),
        token,
        user: user.into(),
    }))
}
