use deadpool_postgres::Pool;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::user::User,
    repositories::user as user_repo,
};

/// The bcrypt work factor used for stored credentials.
const HASH_COST: u32 = 12;

/// Hashes a password with bcrypt at cost 12.
///
/// The hash is CPU-bound and deliberately slow; it runs on the blocking pool
/// so the serving loop keeps making progress.
pub async fn hash_password(password: String) -> Result<String> {
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, HASH_COST)).await?;
    hash.map_err(|e| AppError::Internal(format!("Password hashing failed: {e}")))
}

/// Verifies a candidate password against a stored hash, off the serving loop.
pub async fn verify_password(candidate: String, stored_hash: String) -> Result<bool> {
    let ok = tokio::task::spawn_blocking(move || bcrypt::verify(candidate, &stored_hash)).await?;
    ok.map_err(|e| AppError::Internal(format!("Password verification failed: {e}")))
}

/// Registers a new identity.
///
/// Fails with Conflict when the email is already registered, checked up
/// front and backed by the store's unique index.
pub async fn signup(pool: &Pool, email: String, full_name: String, password: String) -> Result<User> {
    if user_repo::find_by_email(pool, &email, false).await?.is_some() {
        return Err(AppError::Conflict("Email already exists".to_string()));
    }

    let password_hash = hash_password(password).await?;
    let user = user_repo::create_user(pool, Uuid::new_v4(), &email, &full_name, &password_hash).await?;

    tracing::info!(user_id = %user.id, "User registered");
    Ok(user)
}

/// Authenticates an identity by email and password.
///
/// Unknown email and wrong password produce the same error so the response
/// does not reveal which credential was wrong.
pub async fn login(pool: &Pool, email: String, password: String) -> Result<User> {
    let user = user_repo::find_by_email(pool, &email, true)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    if !verify_password(password, user.password.clone()).await? {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    tracing::info!(user_id = %user.id, "User logged in");
    Ok(user)
}
