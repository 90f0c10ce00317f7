use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::store::User;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateAdRequest {
    pub title: String,
    pub description: String,
    pub price: i64,
}

/// Absent or empty fields keep the stored value.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateAdRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
}

/// Single ad with its owner embedded.
#[derive(Debug, Serialize)]
pub struct AdDetails {
    pub id: i64,
    pub user: User,
    pub title: String,
    pub description: String,
    pub price: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
