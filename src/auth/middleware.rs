use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, Method},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::{error::AppError, state::AppState};

/// Paths reachable without a token.
pub const PUBLIC_PATHS: &[&str] = &["/", "/register", "/login"];

/// Verified caller, inserted into request extensions by `require_identity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerId(pub i64);

pub fn is_public(method: &Method, path: &str) -> bool {
    *method == Method::OPTIONS || PUBLIC_PATHS.contains(&path)
}

/// Token from the Authorization header; the `Bearer ` prefix is optional.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let raw = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
    (!token.is_empty()).then_some(token)
}

fn invalid_token() -> AppError {
    AppError::Unauthorized("Invalid token".into())
}

/// Authenticates every non-public request.
///
/// The token only names a user; the store is asked again on every request,
/// so a user that disappears loses access at once.
pub async fn require_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if is_public(request.method(), request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let token = bearer_token(request.headers()).ok_or_else(|| {
        warn!(path = %request.uri().path(), "missing Authorization header");
        invalid_token()
    })?;

    let claims = state.tokens.verify(token).map_err(|e| {
        warn!(error = %e, "token rejected");
        invalid_token()
    })?;

    let user = state.store.find_user(claims.id).await?.ok_or_else(|| {
        warn!(user_id = claims.id, "token for unknown user");
        invalid_token()
    })?;

    request.extensions_mut().insert(CallerId(user.id));
    Ok(next.run(request).await)
}

/// Handler-side access to the caller verified by `require_identity`.
pub struct AuthUser(pub CallerId);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerId>()
            .copied()
            .map(AuthUser)
            .ok_or_else(|| {
                warn!("CallerId missing from request extensions");
                invalid_token()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn strips_optional_bearer_prefix() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&headers("abc.def.ghi")), Some("abc.def.ghi"));
    }

    #[test]
    fn absent_or_empty_credential_is_none() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
        assert_eq!(bearer_token(&headers("")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
    }

    #[test]
    fn allow_list() {
        assert!(is_public(&Method::GET, "/"));
        assert!(is_public(&Method::POST, "/register"));
        assert!(is_public(&Method::POST, "/login"));
        assert!(is_public(&Method::OPTIONS, "/api/ads"));
        assert!(!is_public(&Method::GET, "/api/ads"));
        assert!(!is_public(&Method::GET, "/login/extra"));
    }

    #[tokio::test]
    async fn auth_user_reads_injected_caller() {
        let mut req = axum::http::Request::builder().uri("/").body(()).unwrap();
        req.extensions_mut().insert(CallerId(5));
        let (mut parts, _) = req.into_parts();
        let AuthUser(caller) = AuthUser::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(caller, CallerId(5));
    }

    #[tokio::test]
    async fn auth_user_without_caller_is_unauthorized() {
        let req = axum::http::Request::builder().uri("/").body(()).unwrap();
        let (mut parts, _) = req.into_parts();
        let err = AuthUser::from_request_parts(&mut parts, &()).await.err().unwrap();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
