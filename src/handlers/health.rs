use crate::response::ApiResponse;

/// Health check for the API prefix root.
pub async fn healthcheck() -> ApiResponse<()> {
    tracing::info!("Healthcheck called successfully");
    ApiResponse::message("Route healthy")
}
