use axum::{extract::State, Extension};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::Result,
    extract::{Json, Path},
    models::message::Message,
    models::user::{User, UserPublic},
    response::ApiResponse,
    services::messages as message_service,
    state::AppState,
};

/// The request payload for sending a message. At least one of `text` or
/// `image` is required; the service enforces the refinement.
#[derive(Deserialize, Debug)]
pub struct SendMessageRequest {
    pub text: Option<String>,
    pub image: Option<String>,
}

/// Lists every user except the caller, for the conversation sidebar.
#[axum::debug_handler]
pub async fn chat_partners(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<ApiResponse<Vec<UserPublic>>> {
    let users = message_service::list_chat_partners(&state, user.id).await?;
    Ok(ApiResponse::ok(
        "Get user successfully",
        users.into_iter().map(UserPublic::from).collect(),
    ))
}

/// Returns the conversation between the caller and `receiver_id`.
#[axum::debug_handler]
pub async fn conversation(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(receiver_id): Path<Uuid>,
) -> Result<ApiResponse<Vec<Message>>> {
    let messages = message_service::list_conversation(&state, user.id, receiver_id).await?;
    Ok(ApiResponse::ok("Get all messages successfully", messages))
}

/// Sends a message, pushing it to the receiver's live connection when one is
/// registered.
#[axum::debug_handler]
pub async fn send_message(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(receiver_id): Path<Uuid>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<ApiResponse<Message>> {
    let message = message_service::send_message(
        &state,
        user.id,
        receiver_id,
        payload.text,
        payload.image,
    )
    .await?;

    Ok(ApiResponse::created("Message sent successfully", message))
}
