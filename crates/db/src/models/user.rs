//! User entity model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use taskdeck_core::types::{DbId, Timestamp};

/// A user row from the `users` table.
///
/// Never serialized directly; handlers expose [`PublicUser`] so the
/// password hash stays server-side.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub email: String,
    pub password_hash: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Public account info returned by `GET /auth/me`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: DbId,
    pub email: String,
    pub created_at: Timestamp,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            created_at: user.created_at,
        }
    }
}
