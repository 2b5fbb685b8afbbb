use chrono::{DateTime, Utc};
use deadpool_postgres::Pool;
use tokio_postgres::Row;
use uuid::Uuid;

use crate::{error::Result, models::message::Message};

fn row_to_message(row: &Row) -> Result<Message> {
    Ok(Message {
        id: row.try_get("id")?,
        sender_id: row.try_get("sender_id")?,
        receiver_id: row.try_get("receiver_id")?,
        text: row.try_get("text")?,
        image: row.try_get("image")?,
        created_at: row.try_get::<_, DateTime<Utc>>("created_at")?,
        updated_at: row.try_get::<_, DateTime<Utc>>("updated_at")?,
    })
}

/// Persists a new message. Messages are immutable after this point.
pub async fn insert_message(
    pool: &Pool,
    id: Uuid,
    sender_id: &Uuid,
    receiver_id: &Uuid,
    text: Option<&str>,
    image: Option<&str>,
) -> Result<Message> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            r#"
            INSERT INTO messages (id, sender_id, receiver_id, text, image)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, sender_id, receiver_id, text, image, created_at, updated_at
            "#,
            &[&id, sender_id, receiver_id, &text, &image],
        )
        .await?;
    row_to_message(&row)
}

/// Returns the full conversation between two users, both directions, in
/// insertion order. No pagination by design.
pub async fn list_conversation(pool: &Pool, a: &Uuid, b: &Uuid) -> Result<Vec<Message>> {
    let client = pool.get().await?;
    let rows = client
        .query(
            r#"
            SELECT id, sender_id, receiver_id, text, image, created_at, updated_at
            FROM messages
            WHERE (sender_id = $1 AND receiver_id = $2)
               OR (sender_id = $2 AND receiver_id = $1)
            ORDER BY created_at
            "#,
            &[a, b],
        )
        .await?;
    rows.iter().map(row_to_message).collect()
}
