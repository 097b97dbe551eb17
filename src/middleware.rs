//! Middlewares for routes.

use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use crate::error::Result;
use crate::user::User;
use crate::{AppState, ServerError};

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";
const BEARER: &str = "Bearer ";

/// Token carried on the `Authorization` header, with or without the
/// `Bearer` prefix.
pub fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .map(|header| header.replace(BEARER, ""))
}

/// Pull an access token from the cookie jar, falling back to the
/// `Authorization` header.
pub fn access_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(ACCESS_COOKIE) {
        return Some(cookie.value().to_owned());
    }

    bearer(headers)
}

/// Best-effort viewer identity for routes that work logged out too.
pub fn viewer(
    state: &AppState,
    jar: &CookieJar,
    headers: &HeaderMap,
) -> Option<Uuid> {
    let token = access_token(jar, headers)?;
    let claims = state.token.decode_access(&token).ok()?;
    Uuid::parse_str(&claims.sub).ok()
}

/// Custom middleware for authentification.
///
/// Decodes the access token, loads the user behind it and exposes it as a
/// request extension. Every failure collapses into a 401.
pub async fn auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let token = access_token(&jar, req.headers())
        .ok_or(ServerError::Unauthorized)?;

    let claims = state
        .token
        .decode_access(&token)
        .map_err(|_| ServerError::Unauthorized)?;
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| ServerError::Unauthorized)?;

    let user = state
        .users
        .repo
        .find_by_id(user_id)
        .await
        .map_err(|_| ServerError::Unauthorized)?;

    req.extensions_mut().insert::<User>(user);
    Ok(next.run(req).await)
}
