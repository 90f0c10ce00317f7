use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::{error, info, instrument};

use super::dto::{AdDetails, CreateAdRequest, UpdateAdRequest};
use crate::{
    auth::AuthUser,
    error::{AppError, AppResult},
    extract::Payload,
    policy::ensure_owner,
    state::AppState,
    store::{Ad, NewAd},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/ads", get(list_ads).post(create_ad))
        .route("/api/ads/:id", get(get_ad).put(update_ad))
}

fn ad_not_found() -> AppError {
    AppError::NotFound("Ad not found".into())
}

/// Needs no identity itself; the middleware still guards the path.
#[instrument(skip(state))]
pub async fn list_ads(State(state): State<AppState>) -> AppResult<Json<Vec<Ad>>> {
    Ok(Json(state.store.list_ads().await?))
}

#[instrument(skip(state, _caller))]
pub async fn get_ad(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<AdDetails>> {
    let ad = state.store.find_ad(id).await?.ok_or_else(ad_not_found)?;
    let user = state.store.find_user(ad.user_id).await?.ok_or_else(|| {
        error!(ad_id = ad.id, user_id = ad.user_id, "ad owner missing");
        ad_not_found()
    })?;

    Ok(Json(AdDetails {
        id: ad.id,
        user,
        title: ad.title,
        description: ad.description,
        price: ad.price,
        created_at: ad.created_at,
    }))
}

#[instrument(skip(state, payload))]
pub async fn create_ad(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Payload(payload): Payload<CreateAdRequest>,
) -> AppResult<Json<Ad>> {
    if payload.title.trim().is_empty() || payload.price <= 0 {
        return Err(AppError::Validation("Empty price or title".into()));
    }

    let ad = state
        .store
        .insert_ad(NewAd {
            user_id: caller.0,
            title: payload.title,
            description: payload.description,
            price: payload.price,
        })
        .await?;

    info!(ad_id = ad.id, user_id = ad.user_id, "ad created");
    Ok(Json(ad))
}

#[instrument(skip(state, payload))]
pub async fn update_ad(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<i64>,
    Payload(payload): Payload<UpdateAdRequest>,
) -> AppResult<Json<Ad>> {
    let mut ad = state.store.find_ad(id).await?.ok_or_else(ad_not_found)?;
    ensure_owner(ad.user_id, caller, "access denied")?;

    if payload.price.is_some_and(|p| p < 0) {
        return Err(AppError::Validation("Negative price".into()));
    }
    if let Some(title) = payload.title.filter(|t| !t.trim().is_empty()) {
        ad.title = title;
    }
    if let Some(description) = payload.description.filter(|d| !d.is_empty()) {
        ad.description = description;
    }
    if let Some(price) = payload.price.filter(|p| *p > 0) {
        ad.price = price;
    }

    let ad = state.store.update_ad(&ad).await?.ok_or_else(ad_not_found)?;
    info!(ad_id = ad.id, user_id = ad.user_id, "ad updated");
    Ok(Json(ad))
}
