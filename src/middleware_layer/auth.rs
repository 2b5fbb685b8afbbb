use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use tower_cookies::Cookies;

use crate::{
    error::{AppError, Result},
    repositories::user as user_repo,
    services::token,
    state::AppState,
};

/// Auth guard for `required`-auth routes.
///
/// Reads the `jwt` cookie, verifies the signed claim, loads the asserted
/// user, and injects it as a request extension. Every failure mode (missing,
/// malformed, tampered, expired token, unknown user) is a 401 envelope.
pub async fn require_auth(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response> {
    let cookie = cookies
        .get(token::SESSION_COOKIE)
        .ok_or_else(|| AppError::Unauthorized("No token provided".to_string()))?;

    let claims = token::verify(cookie.value(), state.config.jwt_secret.as_bytes())?;

    let user = user_repo::find_by_id(&state.db, &claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    tracing::debug!(user_id = %user.id, "Request authenticated");
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
