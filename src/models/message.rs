use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A directed message between two users. Immutable after creation.
///
/// At least one of `text` or `image` is always present; the store enforces
/// the same invariant with a CHECK constraint.
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// The unique identifier for the message.
    pub id: Uuid,
    /// The sender's user id.
    pub sender_id: Uuid,
    /// The receiver's user id.
    pub receiver_id: Uuid,
    /// The text body, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// The hosted image URL, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// The timestamp when the message was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the message was last updated.
    pub updated_at: DateTime<Utc>,
}
