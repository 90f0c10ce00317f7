use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};

use super::{Ad, CredentialStore, NewAd, NewUser, ProfileUpdate, StoreError, StoreResult, User};

const USER_COLUMNS: &str = "id, email, password_hash, firstname, lastname, phone, created_at";
const AD_COLUMNS: &str = "id, user_id, title, description, price, created_at";

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        use anyhow::Context;

        let db = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { db })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.db).await?;
        Ok(())
    }
}

// Unique violations become DuplicateEmail: email is the only unique column
// besides the primary keys.
fn map_unique(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::DuplicateEmail,
        _ => StoreError::Database(e),
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let sql = format!(
            "INSERT INTO users (email, password_hash, firstname, lastname, phone) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.firstname)
            .bind(&user.lastname)
            .bind(&user.phone)
            .fetch_one(&self.db)
            .await
            .map_err(map_unique)
    }

    async fn find_user(&self, id: i64) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> StoreResult<bool> {
        let res = sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() == 1)
    }

    async fn update_profile(&self, id: i64, profile: &ProfileUpdate) -> StoreResult<Option<User>> {
        let sql = format!(
            "UPDATE users SET email = $1, firstname = $2, lastname = $3, phone = $4 \
             WHERE id = $5 RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&profile.email)
            .bind(&profile.firstname)
            .bind(&profile.lastname)
            .bind(&profile.phone)
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .map_err(map_unique)
    }

    async fn insert_ad(&self, ad: NewAd) -> StoreResult<Ad> {
        let sql = format!(
            "INSERT INTO ads (user_id, title, description, price) \
             VALUES ($1, $2, $3, $4) RETURNING {AD_COLUMNS}"
        );
        let ad = sqlx::query_as::<_, Ad>(&sql)
            .bind(ad.user_id)
            .bind(&ad.title)
            .bind(&ad.description)
            .bind(ad.price)
            .fetch_one(&self.db)
            .await?;
        Ok(ad)
    }

    async fn find_ad(&self, id: i64) -> StoreResult<Option<Ad>> {
        let sql = format!("SELECT {AD_COLUMNS} FROM ads WHERE id = $1");
        let ad = sqlx::query_as::<_, Ad>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(ad)
    }

    async fn list_ads(&self) -> StoreResult<Vec<Ad>> {
        let sql = format!("SELECT {AD_COLUMNS} FROM ads ORDER BY id DESC");
        let rows = sqlx::query_as::<_, Ad>(&sql).fetch_all(&self.db).await?;
        Ok(rows)
    }

    async fn list_ads_by_owner(&self, user_id: i64) -> StoreResult<Vec<Ad>> {
        let sql = format!("SELECT {AD_COLUMNS} FROM ads WHERE user_id = $1 ORDER BY id DESC");
        let rows = sqlx::query_as::<_, Ad>(&sql)
            .bind(user_id)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn update_ad(&self, ad: &Ad) -> StoreResult<Option<Ad>> {
        let sql = format!(
            "UPDATE ads SET title = $1, description = $2, price = $3 \
             WHERE id = $4 RETURNING {AD_COLUMNS}"
        );
        let ad = sqlx::query_as::<_, Ad>(&sql)
            .bind(&ad.title)
            .bind(&ad.description)
            .bind(ad.price)
            .bind(ad.id)
            .fetch_optional(&self.db)
            .await?;
        Ok(ad)
    }
}
