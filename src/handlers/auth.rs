use axum::{extract::State, Extension};
use garde::Validate;
use serde::Deserialize;
use tower_cookies::Cookies;

use crate::{
    error::Result,
    extract::Json,
    models::user::{User, UserPublic},
    response::ApiResponse,
    services::{auth as auth_service, token},
    state::AppState,
    validation,
};

/// The request payload for signup.
#[derive(Deserialize, Validate, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[garde(length(min = 3))]
    pub full_name: String,
    #[garde(email)]
    pub email: String,
    #[garde(length(min = 6))]
    pub password: String,
}

/// The request payload for login.
#[derive(Deserialize, Validate, Debug)]
pub struct LoginRequest {
    #[garde(email)]
    pub email: String,
    #[garde(length(min = 6))]
    pub password: String,
}

/// Handles user registration. Sets the session cookie on success.
#[axum::debug_handler]
pub async fn signup(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<SignupRequest>,
) -> Result<ApiResponse<UserPublic>> {
    validation::check(&payload)?;

    let user = auth_service::signup(&state.db, payload.email, payload.full_name, payload.password)
        .await?;

    let jwt = token::issue(user.id, state.config.jwt_secret.as_bytes())?;
    cookies.add(token::session_cookie(jwt, state.config.production));

    Ok(ApiResponse::created("User registered successfully", user.into()))
}

/// Handles user login. Sets the session cookie on success; invalid
/// credentials set no cookie.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<LoginRequest>,
) -> Result<ApiResponse<UserPublic>> {
    validation::check(&payload)?;

    let user = auth_service::login(&state.db, payload.email, payload.password).await?;

    let jwt = token::issue(user.id, state.config.jwt_secret.as_bytes())?;
    cookies.add(token::session_cookie(jwt, state.config.production));

    let message = format!("Welcome {}", user.full_name);
    Ok(ApiResponse::ok(message, user.into()))
}

/// Handles logout by clearing the session cookie with the same attributes it
/// was issued with.
#[axum::debug_handler]
pub async fn logout(State(state): State<AppState>, cookies: Cookies) -> Result<ApiResponse<()>> {
    // `add`, not `remove`: the expired cookie must go out even when the
    // request carried no jar to remove from.
    cookies.add(token::removal_cookie(state.config.production));
    Ok(ApiResponse::message("Logged out successfully"))
}

/// Returns the authenticated identity. Never mutates state.
#[axum::debug_handler]
pub async fn check_auth(Extension(user): Extension<User>) -> Result<ApiResponse<UserPublic>> {
    Ok(ApiResponse::ok("User authenticated successfully", user.into()))
}
