//! Update account details.

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
    #[validate(
        length(min = 2, max = 30),
        custom(
            function = "crate::router::validate_username",
            message = "Username must be alphanumeric."
        )
    )]
    username: String,
    #[validate(length(min = 1, max = 80, message = "Full name is required."))]
    full_name: String,
    #[validate(email(message = "Email must be formatted."))]
    email: String,
}

pub async fn handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Valid(body): Valid<Body>,
) -> Result<ApiResponse<User>> {
    let user = state
        .users
        .repo
        .update_account(user.id, &body.username, &body.full_name, &body.email)
        .await?;

    Ok(ApiResponse::new(
        StatusCode::OK,
        user,
        "Account details updated successfully.",
    ))
}
