use std::collections::BTreeMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::{Ad, CredentialStore, NewAd, NewUser, ProfileUpdate, StoreError, StoreResult, User};

/// In-process store for local runs and tests. Not durable.
///
/// Every write holds the single write lock for its whole check-and-mutate
/// sequence, so the email uniqueness rule is as strict as the database one.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    ads: BTreeMap<i64, Ad>,
    next_user_id: i64,
    next_ad_id: i64,
}

impl Tables {
    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops a user record. The API never deletes users; this simulates
    /// deactivation from outside the request path.
    #[cfg(test)]
    pub async fn remove_user(&self, id: i64) -> Option<User> {
        self.inner.write().await.users.remove(&id)
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut t = self.inner.write().await;
        if t.email_taken(&user.email, None) {
            return Err(StoreError::DuplicateEmail);
        }
        t.next_user_id += 1;
        let record = User {
            id: t.next_user_id,
            email: user.email,
            password_hash: user.password_hash,
            firstname: user.firstname,
            lastname: user.lastname,
            phone: user.phone,
            created_at: OffsetDateTime::now_utc(),
        };
        t.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_user(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let t = self.inner.read().await;
        Ok(t.users.values().find(|u| u.email == email).cloned())
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> StoreResult<bool> {
        let mut t = self.inner.write().await;
        match t.users.get_mut(&id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_profile(&self, id: i64, profile: &ProfileUpdate) -> StoreResult<Option<User>> {
        let mut t = self.inner.write().await;
        if t.email_taken(&profile.email, Some(id)) {
            return Err(StoreError::DuplicateEmail);
        }
        Ok(t.users.get_mut(&id).map(|user| {
            user.email = profile.email.clone();
            user.firstname = profile.firstname.clone();
            user.lastname = profile.lastname.clone();
            user.phone = profile.phone.clone();
            user.clone()
        }))
    }

    async fn insert_ad(&self, ad: NewAd) -> StoreResult<Ad> {
        let mut t = self.inner.write().await;
        t.next_ad_id += 1;
        let record = Ad {
            id: t.next_ad_id,
            user_id: ad.user_id,
            title: ad.title,
            description: ad.description,
            price: ad.price,
            created_at: OffsetDateTime::now_utc(),
        };
        t.ads.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_ad(&self, id: i64) -> StoreResult<Option<Ad>> {
        Ok(self.inner.read().await.ads.get(&id).cloned())
    }

    async fn list_ads(&self) -> StoreResult<Vec<Ad>> {
        let t = self.inner.read().await;
        Ok(t.ads.values().rev().cloned().collect())
    }

    async fn list_ads_by_owner(&self, user_id: i64) -> StoreResult<Vec<Ad>> {
        let t = self.inner.read().await;
        Ok(t.ads
            .values()
            .rev()
            .filter(|ad| ad.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update_ad(&self, ad: &Ad) -> StoreResult<Option<Ad>> {
        let mut t = self.inner.write().await;
        Ok(t.ads.get_mut(&ad.id).map(|stored| {
            stored.title = ad.title.clone();
            stored.description = ad.description.clone();
            stored.price = ad.price;
            stored.clone()
        }))
    }
}
