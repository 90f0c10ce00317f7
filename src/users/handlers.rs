use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::{PasswordChangeRequest, ProfileRequest};
use crate::{
    auth::{email, password, AuthUser},
    error::{AppError, AppResult},
    extract::Payload,
    policy::ensure_owner,
    state::AppState,
    store::{Ad, ProfileUpdate, User},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/users/:id", get(get_user).put(update_profile))
        .route("/api/users/:id/password", put(update_password))
        .route("/api/users/:id/ads", get(list_user_ads))
}

fn invalid_user() -> AppError {
    AppError::Unauthorized("Invalid user".into())
}

#[instrument(skip(state, _caller))]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<User>> {
    let user = state.store.find_user(id).await?.ok_or_else(invalid_user)?;
    Ok(Json(user))
}

#[instrument(skip(state, payload))]
pub async fn update_password(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<i64>,
    Payload(payload): Payload<PasswordChangeRequest>,
) -> AppResult<StatusCode> {
    ensure_owner(id, caller, "Invalid user")?;
    if payload.new_password.is_empty() {
        return Err(AppError::Validation("Empty password".into()));
    }

    let digest = password::hash_off_thread(payload.new_password).await?;
    if !state.store.update_password(id, &digest).await? {
        return Err(invalid_user());
    }

    info!(user_id = id, "password changed");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<i64>,
    Payload(payload): Payload<ProfileRequest>,
) -> AppResult<Json<User>> {
    ensure_owner(id, caller, "Invalid user")?;

    let email = email::normalize(&payload.email);
    if email.is_empty() {
        return Err(AppError::Validation("Empty email".into()));
    }
    if !email::is_valid(&email) {
        return Err(AppError::Validation("Invalid email".into()));
    }
    if let Some(other) = state.store.find_user_by_email(&email).await? {
        if other.id != id {
            return Err(AppError::Conflict("Duplicate e-mail".into()));
        }
    }

    let profile = ProfileUpdate {
        email,
        firstname: payload.firstname,
        lastname: payload.lastname,
        phone: payload.phone,
    };
    let user = state
        .store
        .update_profile(id, &profile)
        .await?
        .ok_or_else(invalid_user)?;

    info!(user_id = id, "profile updated");
    Ok(Json(user))
}

#[instrument(skip(state, _caller))]
pub async fn list_user_ads(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<Ad>>> {
    if state.store.find_user(id).await?.is_none() {
        return Err(AppError::NotFound("User not found".into()));
    }
    Ok(Json(state.store.list_ads_by_owner(id).await?))
}
