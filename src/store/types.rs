use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // argon2 PHC string, never sent to clients
    pub firstname: String,
    pub lastname: String,
    pub phone: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Classified ad owned by exactly one user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ad {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub price: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub firstname: String,
    pub lastname: String,
    pub phone: String,
}

#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub email: String,
    pub firstname: String,
    pub lastname: String,
    pub phone: String,
}

#[derive(Debug, Clone)]
pub struct NewAd {
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub price: i64,
}
