use crate::state::AppState;
use axum::Router;

mod claims;
mod dto;
pub(crate) mod email;
pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use middleware::{require_identity, AuthUser, CallerId};

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
