//! Change the account password.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::Result;
use crate::router::{ApiResponse, Valid};
use crate::user::User;
use crate::AppState;

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    #[validate(length(min = 1, message = "Old password is required."))]
    old_password: String,
    #[validate(length(
        min = 8,
        max = 255,
        message = "Password must contain at least 8 characters."
    ))]
    new_password: String,
}

pub async fn handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Valid(body): Valid<Body>,
) -> Result<ApiResponse<serde_json::Value>> {
    state
        .users
        .change_password(&user, &body.old_password, &body.new_password)
        .await?;

    tracing::info!(user_id = %user.id, "password changed");

    Ok(ApiResponse::new(
        StatusCode::OK,
        serde_json::json!({}),
        "Password updated successfully.",
    ))
}
