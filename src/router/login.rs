//! Password login issuing the session token pair.

use axum::extract::State;
use axum::http::StatusCode;
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::{Result, ServerError};
use crate::middleware::{ACCESS_COOKIE, REFRESH_COOKIE};
use crate::router::{ApiResponse, Valid, secure_cookie};
use crate::user::User;
use crate::AppState;

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_credentials"))]
pub struct Body {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// A password plus at least one of username or email.
fn validate_credentials(
    body: &Body,
) -> std::result::Result<(), ValidationError> {
    let has_identifier = body
        .username
        .as_deref()
        .is_some_and(|username| !username.trim().is_empty())
        || body
            .email
            .as_deref()
            .is_some_and(|email| !email.trim().is_empty());
    let has_password = body
        .password
        .as_deref()
        .is_some_and(|password| !password.is_empty());

    if has_identifier && has_password {
        Ok(())
    } else {
        Err(ValidationError::new("credentials").with_message(
            "Password and a username or an email are required.".into(),
        ))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Data {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

/// Handler to log a user in.
pub async fn handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Valid(body): Valid<Body>,
) -> Result<(CookieJar, ApiResponse<Data>)> {
    let user = state
        .users
        .repo
        .find_by_login(body.username.as_deref(), body.email.as_deref())
        .await?
        .ok_or(ServerError::NotFound("Invalid credentials."))?;

    let password = body.password.as_deref().unwrap_or_default();
    if !state.users.verify_password(&user, password)? {
        return Err(ServerError::InvalidCredentials);
    }

    let tokens = state.users.issue_tokens(user.id).await?;
    // Reload so the body reflects the persisted session.
    let user = state.users.repo.find_by_id(user.id).await?;

    tracing::info!(user_id = %user.id, "user logged in");

    let jar = jar
        .add(secure_cookie(ACCESS_COOKIE, tokens.access.clone()))
        .add(secure_cookie(REFRESH_COOKIE, tokens.refresh.clone()));

    Ok((
        jar,
        ApiResponse::new(
            StatusCode::OK,
            Data {
                user,
                access_token: tokens.access,
                refresh_token: tokens.refresh,
            },
            "User logged in successfully.",
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(
        username: Option<&str>,
        email: Option<&str>,
        password: Option<&str>,
    ) -> Body {
        Body {
            username: username.map(str::to_owned),
            email: email.map(str::to_owned),
            password: password.map(str::to_owned),
        }
    }

    #[test]
    fn test_username_alone_is_enough() {
        assert!(body(Some("chai"), None, Some("secret")).validate().is_ok());
    }

    #[test]
    fn test_email_alone_is_enough() {
        assert!(
            body(None, Some("chai@gmail.com"), Some("secret"))
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn test_password_is_mandatory() {
        assert!(body(Some("chai"), None, None).validate().is_err());
        assert!(body(Some("chai"), None, Some("")).validate().is_err());
    }

    #[test]
    fn test_identifier_is_mandatory() {
        assert!(body(None, None, Some("secret")).validate().is_err());
        assert!(body(Some("  "), None, Some("secret")).validate().is_err());
    }
}
