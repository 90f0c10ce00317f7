//! Persistence of users and ads behind a narrow async contract.
//!
//! Handlers and the identity middleware only ever see `dyn CredentialStore`;
//! PostgreSQL backs it in production and `MemoryStore` in local runs and tests.

use async_trait::async_trait;
use thiserror::Error;

mod memory;
mod postgres;
mod types;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use types::{Ad, NewAd, NewUser, ProfileUpdate, User};

#[derive(Debug, Error)]
pub enum StoreError {
    /// The unique email constraint rejected the write.
    #[error("email already registered")]
    DuplicateEmail,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;
    async fn find_user(&self, id: i64) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    /// Returns `false` when no user has this id.
    async fn update_password(&self, id: i64, password_hash: &str) -> StoreResult<bool>;
    async fn update_profile(&self, id: i64, profile: &ProfileUpdate) -> StoreResult<Option<User>>;

    async fn insert_ad(&self, ad: NewAd) -> StoreResult<Ad>;
    async fn find_ad(&self, id: i64) -> StoreResult<Option<Ad>>;
    /// All ads, newest first.
    async fn list_ads(&self) -> StoreResult<Vec<Ad>>;
    /// Ads of one owner, newest first.
    async fn list_ads_by_owner(&self, user_id: i64) -> StoreResult<Vec<Ad>>;
    /// Writes title, description and price; owner and id never change.
    async fn update_ad(&self, ad: &Ad) -> StoreResult<Option<Ad>>;
}
