use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use thiserror::Error;

static PRODUCTION: OnceLock<bool> = OnceLock::new();

/// Records the environment once at startup so the envelope formatter and
/// `Config::production` cannot disagree. Unset (tests) means development.
pub fn set_production(production: bool) {
    let _ = PRODUCTION.set(production);
}

fn is_production() -> bool {
    PRODUCTION.get().copied().unwrap_or(false)
}

/// The application's error type.
///
/// Every handler funnels failures here; `into_response` is the single point
/// that formats the uniform `{success, status, message, errors?}` envelope.
#[derive(Error, Debug)]
pub enum AppError {
    /// A database error.
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    /// A database pool error.
    #[error("Database pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// A database pool construction error.
    #[error("Database pool error: {0}")]
    CreatePool(#[from] deadpool_postgres::CreatePoolError),

    /// A blocking-task join error (offloaded password hashing).
    #[error("Blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// A malformed request.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An authentication error.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// An expired session token. Same HTTP outcome as `Unauthorized`,
    /// distinguished only for logging.
    #[error("Token expired")]
    TokenExpired,

    /// An authorization error.
    #[error("Forbidden")]
    Forbidden,

    /// A resource not found error.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A uniqueness conflict (already-registered email).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A duplicate-key violation surfaced by the store, with per-field detail.
    #[error("Duplicate field value entered")]
    DuplicateKey(BTreeMap<String, String>),

    /// A payload validation failure, with a field -> message map.
    #[error("Validation failed")]
    Validation(BTreeMap<String, String>),

    /// An image hosting upload failure.
    #[error("Image upload failed: {0}")]
    Upload(String),

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Builds a single-field validation error.
    pub fn validation(field: &str, message: &str) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(field.to_string(), message.to_string());
        AppError::Validation(errors)
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) | AppError::TokenExpired => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) | AppError::DuplicateKey(_) => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// The uniform error envelope. `errors` carries field-level detail for
/// validation and duplicate-key failures; `stack` only exists outside
/// production.
#[derive(serde::Serialize)]
struct ErrorEnvelope {
    success: bool,
    status: u16,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stack: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.to_string();

        let (message, errors) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                ("Database error".to_string(), None)
            }

            AppError::Pool(ref e) => {
                tracing::error!("Database pool error: {}", e);
                ("Database error".to_string(), None)
            }

            AppError::CreatePool(ref e) => {
                tracing::error!("Database pool error: {}", e);
                ("Database error".to_string(), None)
            }

            AppError::Task(ref e) => {
                tracing::error!("Blocking task failed: {}", e);
                ("Internal server error".to_string(), None)
            }

            AppError::BadRequest(msg) => {
                tracing::debug!("Bad request: {}", msg);
                (msg, None)
            }

            AppError::Unauthorized(msg) => {
                tracing::warn!("Unauthorized: {}", msg);
                (msg, None)
            }

            AppError::TokenExpired => {
                tracing::warn!("Token expired");
                ("Token expired".to_string(), None)
            }

            AppError::Forbidden => {
                tracing::warn!("Forbidden");
                ("Forbidden".to_string(), None)
            }

            AppError::NotFound(msg) => {
                tracing::debug!("Not found: {}", msg);
                (msg, None)
            }

            AppError::Conflict(msg) => {
                tracing::warn!("Conflict: {}", msg);
                (msg, None)
            }

            AppError::DuplicateKey(errors) => {
                tracing::warn!("Duplicate key: {:?}", errors);
                ("Duplicate field value entered".to_string(), Some(errors))
            }

            AppError::Validation(errors) => {
                tracing::debug!("Validation failed: {:?}", errors);
                ("Validation failed".to_string(), Some(errors))
            }

            AppError::Upload(ref e) => {
                tracing::error!("Image upload failed: {}", e);
                ("Image upload failed".to_string(), None)
            }

            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                ("Internal server error".to_string(), None)
            }
        };

        let envelope = ErrorEnvelope {
            success: false,
            status: status.as_u16(),
            message,
            errors,
            stack: (!is_production()).then_some(detail),
        };

        let body = sonic_rs::to_string(&envelope)
            .unwrap_or_else(|_| r#"{"success":false,"status":500,"message":"Internal server error"}"#.to_string());

        (status, [(http::header::CONTENT_TYPE, "application/json")], body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_maps_to_422_with_field_errors() {
        let err = AppError::validation("message", "Message must contain either text or an image");
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["status"], 422);
        assert_eq!(
            body["errors"]["message"],
            "Message must contain either text or an image"
        );
    }

    #[tokio::test]
    async fn conflict_maps_to_409() {
        let response = AppError::Conflict("Email already exists".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = body_json(response).await;
        assert_eq!(body["message"], "Email already exists");
    }

    #[tokio::test]
    async fn expired_and_invalid_tokens_both_map_to_401() {
        assert_eq!(
            AppError::TokenExpired.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Unauthorized("Token verification failed".to_string())
                .into_response()
                .status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn development_envelope_carries_the_stack_detail() {
        // The flag is never set in tests, which defaults to development.
        let response = AppError::NotFound("User not found".to_string()).into_response();
        let body = body_json(response).await;
        assert!(body["stack"].is_string());
    }

    #[tokio::test]
    async fn internal_errors_hide_detail_in_the_message() {
        let response = AppError::Internal("pool exhausted".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["message"], "Internal server error");
    }
}
