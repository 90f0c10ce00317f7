//! Password digests: argon2id with a random salt, stored as PHC strings.

use anyhow::Context;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

pub fn hash(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let digest = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(digest)
}

/// A digest that does not parse never matches.
pub fn verify(plain: &str, digest: &str) -> bool {
    let parsed = match PasswordHash::new(digest) {
        Ok(p) => p,
        Err(e) => {
            error!(error = %e, "stored password digest is not a PHC string");
            return false;
        }
    };
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}

/// [`hash`] on the blocking pool, off the async workers.
pub async fn hash_off_thread(plain: String) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || hash(&plain))
        .await
        .context("password hashing task failed")?
}

pub async fn verify_off_thread(plain: String, digest: String) -> anyhow::Result<bool> {
    tokio::task::spawn_blocking(move || verify(&plain, &digest))
        .await
        .context("password verification task failed")
}
