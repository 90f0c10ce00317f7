use axum::{extract::State, routing::post, Json, Router};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest, TokenResponse},
        email, password,
    },
    error::{AppError, AppResult},
    extract::Payload,
    state::AppState,
    store::{NewUser, User},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// Same answer for unknown email and wrong password.
fn invalid_credential() -> AppError {
    AppError::Unauthorized("Invalid credential".into())
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Payload(payload): Payload<RegisterRequest>,
) -> AppResult<Json<User>> {
    if payload.text_password.is_empty() {
        return Err(AppError::Validation("Empty password".into()));
    }
    let email = email::normalize(&payload.email);
    if email.is_empty() {
        return Err(AppError::Validation("Empty email".into()));
    }
    if !email::is_valid(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::Validation("Invalid email".into()));
    }

    // Fast path for a readable error; the unique constraint is what
    // actually settles concurrent registrations.
    if state.store.find_user_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::Conflict("Duplicate e-mail".into()));
    }

    let password_hash = password::hash_off_thread(payload.text_password).await?;
    let user = state
        .store
        .insert_user(NewUser {
            email,
            password_hash,
            firstname: payload.firstname,
            lastname: payload.lastname,
            phone: payload.phone,
        })
        .await?;

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok(Json(user))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Payload(payload): Payload<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::Validation("Missing fields".into()));
    }
    let email = email::normalize(&payload.username);

    let Some(user) = state.store.find_user_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(invalid_credential());
    };

    let matches =
        password::verify_off_thread(payload.password, user.password_hash.clone()).await?;
    if !matches {
        warn!(user_id = user.id, "login invalid password");
        return Err(invalid_credential());
    }

    let token = state.tokens.issue(&user)?;
    info!(user_id = user.id, "user logged in");
    Ok(Json(TokenResponse { token }))
}
