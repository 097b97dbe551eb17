//! End the active session.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum_extra::extract::cookie::CookieJar;

use crate::error::Result;
use crate::middleware::{ACCESS_COOKIE, REFRESH_COOKIE};
use crate::router::{removal_cookie, ApiResponse};
use crate::user::User;
use crate::AppState;

pub async fn handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Extension(user): Extension<User>,
) -> Result<(CookieJar, ApiResponse<serde_json::Value>)> {
    state.users.logout(user.id).await?;

    tracing::info!(user_id = %user.id, "user logged out");

    let jar = jar
        .add(removal_cookie(ACCESS_COOKIE))
        .add(removal_cookie(REFRESH_COOKIE));

    Ok((
        jar,
        ApiResponse::new(
            StatusCode::OK,
            serde_json::json!({}),
            "User logged out successfully.",
        ),
    ))
}
