//! Get the authenticated user.

use axum::Extension;
use axum::http::StatusCode;

use crate::router::ApiResponse;
use crate::user::User;

pub async fn handler(Extension(user): Extension<User>) -> ApiResponse<User> {
    ApiResponse::new(
        StatusCode::OK,
        user,
        "Current user fetched successfully.",
    )
}
