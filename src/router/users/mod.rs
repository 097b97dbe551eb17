//! Token-protected account routes.

mod avatar;
mod cover;
mod get;
mod logout;
mod password;
mod update;

use axum::body::Bytes;
use axum::extract::Multipart;
use axum::routing::post;
use axum::{Router, middleware as AxumMiddleware};
use validator::{ValidationError, ValidationErrors};

use crate::error::{Result, ServerError};
use crate::{AppState, middleware};

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        // `POST /logout` ends the active session.
        .route("/logout", post(logout::handler))
        // `POST /change-password` rotates the stored hash.
        .route("/change-password", post(password::handler))
        // `POST /get-user` returns the authenticated user.
        .route("/get-user", post(get::handler))
        // `POST /update-user` rewrites account details.
        .route("/update-user", post(update::handler))
        // `POST /update-user-avatar` uploads and stores a new avatar.
        .route("/update-user-avatar", post(avatar::handler))
        // `POST /update-cover-image` uploads and stores a new cover image.
        .route("/update-cover-image", post(cover::handler))
        .route_layer(AxumMiddleware::from_fn_with_state(
            state,
            middleware::auth,
        ))
}

/// Read one named file out of a multipart form.
async fn read_file(
    mut multipart: Multipart,
    name: &'static str,
) -> Result<Bytes> {
    let mut buffer = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ServerError::ParsingForm(Box::new(err)))?
    {
        if field.name() == Some(name) {
            buffer = Some(
                field
                    .bytes()
                    .await
                    .map_err(|err| ServerError::ParsingForm(Box::new(err)))?,
            );
        }
    }

    buffer
        .filter(|buffer| !buffer.is_empty())
        .ok_or_else(|| missing_file(name).into())
}

fn missing_file(name: &'static str) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(
        name,
        ValidationError::new("file").with_message("File is required.".into()),
    );
    errors
}
