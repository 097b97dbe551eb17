//! Account registration with avatar upload.

use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::AppState;
use crate::error::{Result, ServerError};
use crate::router::ApiResponse;
use crate::user::{User, UserBuilder};

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(
        length(min = 2, max = 30),
        custom(
            function = "crate::router::validate_username",
            message = "Username must be alphanumeric."
        )
    )]
    pub username: String,
    #[validate(custom(
        function = "crate::router::validate_email_provider",
        message = "Email provider is not supported."
    ))]
    pub email: String,
    #[validate(length(min = 1, max = 80, message = "Full name is required."))]
    pub full_name: String,
    #[validate(length(
        min = 8,
        max = 255,
        message = "Password must contain at least 8 characters."
    ))]
    pub password: String,
}

/// Multipart fields collected from the registration form.
#[derive(Debug, Default)]
struct Form {
    body: Body,
    avatar: Option<Bytes>,
    cover_image: Option<Bytes>,
}

async fn read_form(mut multipart: Multipart) -> Result<Form> {
    let mut form = Form::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ServerError::ParsingForm(Box::new(err)))?
    {
        let parsing = |err| ServerError::ParsingForm(Box::new(err));
        let name = field.name().map(str::to_owned);

        match name.as_deref() {
            Some("username") => {
                form.body.username = field.text().await.map_err(parsing)?;
            },
            Some("email") => {
                form.body.email = field.text().await.map_err(parsing)?;
            },
            Some("fullName") => {
                form.body.full_name = field.text().await.map_err(parsing)?;
            },
            Some("password") => {
                form.body.password = field.text().await.map_err(parsing)?;
            },
            Some("avatar") => {
                form.avatar = Some(field.bytes().await.map_err(parsing)?);
            },
            Some("coverImage") => {
                form.cover_image = Some(field.bytes().await.map_err(parsing)?);
            },
            _ => {},
        }
    }

    Ok(form)
}

fn missing_avatar() -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(
        "avatar",
        ValidationError::new("avatar")
            .with_message("Avatar is required.".into()),
    );
    errors
}

fn already_exists() -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(
        "username",
        ValidationError::new("unique")
            .with_message("Email or username already exists.".into()),
    );
    errors
}

/// Handler to create user.
pub async fn handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<ApiResponse<User>> {
    let form = read_form(multipart).await?;
    form.body.validate()?;

    let avatar = form
        .avatar
        .filter(|buffer| !buffer.is_empty())
        .ok_or_else(missing_avatar)?;

    // Advisory pre-check. The store's UNIQUE constraints still win any race
    // between two identical registrations.
    if state
        .users
        .repo
        .is_taken(&form.body.username.to_lowercase(), &form.body.email)
        .await?
    {
        return Err(already_exists().into());
    }

    let avatar_url = state.media.upload(&avatar).await?;

    // A failed cover upload degrades to an account without one.
    let mut cover_url = None;
    if let Some(cover) = form.cover_image.filter(|buffer| !buffer.is_empty()) {
        match state.media.upload(&cover).await {
            Ok(url) => cover_url = Some(url),
            Err(err) => {
                tracing::warn!(error = %err, "cover image upload failed");
            },
        }
    }

    let user = UserBuilder::new()
        .username(form.body.username)
        .email(form.body.email)
        .full_name(form.body.full_name)
        .password(form.body.password)
        .avatar(avatar_url)
        .cover_image(cover_url)
        .build();
    let user = state.users.register(user).await?;

    tracing::info!(user_id = %user.id, "user created");

    Ok(ApiResponse::new(
        StatusCode::CREATED,
        user,
        "User created successfully.",
    ))
}

#[cfg(test)]
pub(super) mod tests {
    use axum::body::Body as HttpBody;
    use axum::http::{Method, Request, StatusCode, header};
    use tower::util::ServiceExt;

    use crate::{app, router};

    pub const BOUNDARY: &str = "vidtube-test-boundary";

    /// Build a multipart/form-data payload by hand.
    pub fn multipart_payload(
        fields: &[(&str, &str)],
        files: &[(&str, &[u8])],
    ) -> Vec<u8> {
        let mut payload = Vec::new();

        for (name, value) in fields {
            payload.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; \
                     name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        for (name, bytes) in files {
            payload.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; \
                     name=\"{name}\"; filename=\"{name}.png\"\r\n\
                     Content-Type: image/png\r\n\r\n"
                )
                .as_bytes(),
            );
            payload.extend_from_slice(bytes);
            payload.extend_from_slice(b"\r\n");
        }
        payload.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        payload
    }

    async fn register(
        fields: &[(&str, &str)],
        files: &[(&str, &[u8])],
    ) -> axum::http::Response<axum::body::Body> {
        let app = app(router::state());

        app.oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/register")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(HttpBody::from(multipart_payload(fields, files)))
                .unwrap(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_rejects_foreign_email_provider() {
        let response = register(
            &[
                ("username", "chai"),
                ("email", "chai@example.com"),
                ("fullName", "Chai Aur Code"),
                ("password", "P$soW%920$n&"),
            ],
            &[("avatar", b"png-bytes".as_slice())],
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_rejects_missing_avatar() {
        let response = register(
            &[
                ("username", "chai"),
                ("email", "chai@gmail.com"),
                ("fullName", "Chai Aur Code"),
                ("password", "P$soW%920$n&"),
            ],
            &[],
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_rejects_empty_fields() {
        let response = register(
            &[
                ("username", "chai"),
                ("email", "chai@gmail.com"),
                ("fullName", ""),
                ("password", "P$soW%920$n&"),
            ],
            &[("avatar", b"png-bytes".as_slice())],
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
