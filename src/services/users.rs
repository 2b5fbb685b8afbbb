use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::user::User,
    repositories::user as user_repo,
    services::uploads,
    state::AppState,
};

/// Lists every registered user.
pub async fn list_users(state: &AppState) -> Result<Vec<User>> {
    user_repo::list_users(&state.db).await
}

/// Fetches one user by id. Absent ids are a 400, matching the public
/// user-lookup contract.
pub async fn get_user(state: &AppState, id: Uuid) -> Result<User> {
    user_repo::find_by_id(&state.db, &id)
        .await?
        .ok_or_else(|| AppError::BadRequest("User not found".to_string()))
}

/// Uploads the new profile picture and updates exactly that field.
pub async fn update_profile_pic(state: &AppState, user_id: Uuid, profile_pic: &str) -> Result<User> {
    let hosted_url = uploads::upload_image(&state.http, &state.config.cloudinary, profile_pic).await?;

    user_repo::update_profile_pic(&state.db, &user_id, &hosted_url)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}
