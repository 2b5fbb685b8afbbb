use axum::{extract::State, Extension};
use garde::Validate;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::Result,
    extract::{Json, Path},
    models::user::{User, UserPublic},
    response::ApiResponse,
    services::users as user_service,
    state::AppState,
    validation,
};

/// The request payload for a profile update. Only the picture is mutable.
#[derive(Deserialize, Validate, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[garde(length(min = 1))]
    pub profile_pic: String,
}

/// Lists every registered user.
#[axum::debug_handler]
pub async fn list_users(State(state): State<AppState>) -> Result<ApiResponse<Vec<UserPublic>>> {
    let users = user_service::list_users(&state).await?;
    Ok(ApiResponse::ok(
        "Get user successfully",
        users.into_iter().map(UserPublic::from).collect(),
    ))
}

/// Fetches one user by id.
#[axum::debug_handler]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<UserPublic>> {
    let user = user_service::get_user(&state, id).await?;
    Ok(ApiResponse::ok("Get user successfully", user.into()))
}

/// Updates the caller's profile picture.
#[axum::debug_handler]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<ApiResponse<UserPublic>> {
    validation::check(&payload)?;

    let updated = user_service::update_profile_pic(&state, user.id, &payload.profile_pic).await?;
    Ok(ApiResponse::ok("Profile updated successfully", updated.into()))
}
