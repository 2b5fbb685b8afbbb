use chrono::{DateTime, Utc};
use deadpool_postgres::Pool;
use std::collections::BTreeMap;
use tokio_postgres::error::SqlState;
use tokio_postgres::Row;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::user::User,
};

/// Maps a row fetched without the credential projection.
fn row_to_user(row: &Row) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        full_name: row.try_get("full_name")?,
        password: String::new(),
        profile_pic: row.try_get("profile_pic")?,
        created_at: row.try_get::<_, DateTime<Utc>>("created_at")?,
        updated_at: row.try_get::<_, DateTime<Utc>>("updated_at")?,
    })
}

/// Maps a row fetched with the credential projection (login path only).
fn row_to_user_with_password(row: &Row) -> Result<User> {
    let mut user = row_to_user(row)?;
    user.password = row.try_get("password")?;
    Ok(user)
}

/// Creates a new user. The password must already be hashed.
///
/// A unique-violation on the email column is surfaced as a duplicate-key
/// conflict with a field-level message.
pub async fn create_user(
    pool: &Pool,
    id: Uuid,
    email: &str,
    full_name: &str,
    password_hash: &str,
) -> Result<User> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            r#"
            INSERT INTO users (id, email, full_name, password)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, full_name, profile_pic, created_at, updated_at
            "#,
            &[&id, &email, &full_name, &password_hash],
        )
        .await
        .map_err(|e| duplicate_email_to_conflict(e, email))?;
    row_to_user(&row)
}

fn duplicate_email_to_conflict(e: tokio_postgres::Error, email: &str) -> AppError {
    if let Some(db_err) = e.as_db_error() {
        if db_err.code() == &SqlState::UNIQUE_VIOLATION {
            let mut errors = BTreeMap::new();
            errors.insert(
                "email".to_string(),
                format!("email with value '{email}' already exists"),
            );
            return AppError::DuplicateKey(errors);
        }
    }
    AppError::Database(e)
}

/// Finds a user by email. The password hash is included only when
/// `include_password` is set.
pub async fn find_by_email(
    pool: &Pool,
    email: &str,
    include_password: bool,
) -> Result<Option<User>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            SELECT id, email, full_name, profile_pic, created_at, updated_at, password
            FROM users
            WHERE email = $1
            "#,
            &[&email],
        )
        .await?;
    row.map(|r| {
        if include_password {
            row_to_user_with_password(&r)
        } else {
            row_to_user(&r)
        }
    })
    .transpose()
}

/// Finds a user by id. The password hash is never included.
pub async fn find_by_id(pool: &Pool, user_id: &Uuid) -> Result<Option<User>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            SELECT id, email, full_name, profile_pic, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
            &[user_id],
        )
        .await?;
    row.map(|r| row_to_user(&r)).transpose()
}

/// Lists every user in store order.
pub async fn list_users(pool: &Pool) -> Result<Vec<User>> {
    let client = pool.get().await?;
    let rows = client
        .query(
            r#"
            SELECT id, email, full_name, profile_pic, created_at, updated_at
            FROM users
            ORDER BY created_at
            "#,
            &[],
        )
        .await?;
    rows.iter().map(row_to_user).collect()
}

/// Lists every user except the caller, in store order.
pub async fn list_users_except(pool: &Pool, user_id: &Uuid) -> Result<Vec<User>> {
    let client = pool.get().await?;
    let rows = client
        .query(
            r#"
            SELECT id, email, full_name, profile_pic, created_at, updated_at
            FROM users
            WHERE id <> $1
            ORDER BY created_at
            "#,
            &[user_id],
        )
        .await?;
    rows.iter().map(row_to_user).collect()
}

/// Updates exactly the profile-picture column.
pub async fn update_profile_pic(pool: &Pool, user_id: &Uuid, url: &str) -> Result<Option<User>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            UPDATE users
            SET profile_pic = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING id, email, full_name, profile_pic, created_at, updated_at
            "#,
            &[&url, user_id],
        )
        .await?;
    row.map(|r| row_to_user(&r)).transpose()
}
