//! Replace the user avatar.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Extension;

use crate::error::Result;
use crate::router::ApiResponse;
use crate::user::User;
use crate::AppState;

pub async fn handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    multipart: Multipart,
) -> Result<ApiResponse<User>> {
    let buffer = super::read_file(multipart, "avatar").await?;

    let url = state.media.upload(&buffer).await?;
    let user = state.users.repo.set_avatar(user.id, &url).await?;

    Ok(ApiResponse::new(
        StatusCode::OK,
        user,
        "Avatar updated successfully.",
    ))
}
