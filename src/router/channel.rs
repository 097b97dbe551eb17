//! Public channel profile with subscription counts.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum_extra::extract::cookie::CookieJar;

use crate::error::{Result, ServerError};
use crate::router::ApiResponse;
use crate::user::ChannelProfile;
use crate::{AppState, middleware};

/// Handler to fetch a channel profile by username.
///
/// Works logged out. When a valid access token rides along, the membership
/// flag reflects whether that viewer subscribes to the channel.
pub async fn handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<ApiResponse<ChannelProfile>> {
    let viewer = middleware::viewer(&state, &jar, &headers);

    let profile = state
        .users
        .repo
        .channel_profile(&username, viewer)
        .await?
        .ok_or(ServerError::NotFound("Channel not found."))?;

    Ok(ApiResponse::new(
        StatusCode::OK,
        profile,
        "Channel profile fetched successfully.",
    ))
}
