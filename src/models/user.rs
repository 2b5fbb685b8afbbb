use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Represents a registered identity.
///
/// The `password` field holds the bcrypt hash and never leaves the process;
/// responses use [`UserPublic`].
#[derive(Clone, Debug)]
pub struct User {
    /// The unique identifier for the user.
    pub id: Uuid,
    /// The user's email address (unique).
    pub email: String,
    /// The user's display name.
    pub full_name: String,
    /// The bcrypt hash of the user's password. Empty when the row was
    /// fetched without the credential projection.
    pub password: String,
    /// The hosted URL of the user's profile picture, empty if unset.
    pub profile_pic: String,
    /// The timestamp when the user was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// The serializable projection of a [`User`], with the credential excluded.
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UserPublic {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub profile_pic: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserPublic {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            profile_pic: user.profile_pic,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_projection_never_serializes_the_credential() {
        let user = User {
            id: Uuid::new_v4(),
            email: "alice@example.com".to_string(),
            full_name: "Alice".to_string(),
            password: "$2b$12$secret-hash".to_string(),
            profile_pic: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = sonic_rs::to_string(&UserPublic::from(user)).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains("secret-hash"));
        assert!(json.contains("fullName"));
    }
}
