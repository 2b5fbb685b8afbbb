use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::message::Message,
    models::user::User,
    realtime::presence::{self, NEW_MESSAGE_EVENT},
    repositories::{message as message_repo, user as user_repo},
    services::uploads,
    state::AppState,
};

/// Sends a message from `sender_id` to `receiver_id`.
///
/// Image payloads are uploaded and replaced with hosted URLs before
/// persistence. After the message is persisted, it is pushed to the
/// receiver's live connection if one is registered; fan-out failure never
/// affects the persisted message.
pub async fn send_message(
    state: &AppState,
    sender_id: Uuid,
    receiver_id: Uuid,
    text: Option<String>,
    image: Option<String>,
) -> Result<Message> {
    if text.as_deref().is_none_or(str::is_empty) && image.as_deref().is_none_or(str::is_empty) {
        return Err(AppError::validation(
            "message",
            "Message must contain either text or an image",
        ));
    }

    if user_repo::find_by_id(&state.db, &receiver_id).await?.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let image_url = match image.as_deref().filter(|i| !i.is_empty()) {
        Some(payload) => Some(uploads::upload_image(&state.http, &state.config.cloudinary, payload).await?),
        None => None,
    };

    let message = message_repo::insert_message(
        &state.db,
        Uuid::new_v4(),
        &sender_id,
        &receiver_id,
        text.as_deref().filter(|t| !t.is_empty()),
        image_url.as_deref(),
    )
    .await?;

    if let Some(sender) = state.presence.lookup(&receiver_id).await {
        presence::push_event(&sender, NEW_MESSAGE_EVENT, &message);
        tracing::debug!(message_id = %message.id, %receiver_id, "Message pushed to live connection");
    }

    Ok(message)
}

/// Returns the full conversation between the caller and another user, both
/// directions, in insertion order.
pub async fn list_conversation(
    state: &AppState,
    self_id: Uuid,
    other_id: Uuid,
) -> Result<Vec<Message>> {
    message_repo::list_conversation(&state.db, &self_id, &other_id).await
}

/// Returns every user except the caller, for the conversation sidebar.
pub async fn list_chat_partners(state: &AppState, self_id: Uuid) -> Result<Vec<User>> {
    user_repo::list_users_except(&state.db, &self_id).await
}
