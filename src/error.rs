//! Error handler for vidtube.

use axum::extract::rejection::JsonRejection;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use sqlx::Error as SQLxError;
use thiserror::Error;
use validator::ValidationErrors;

pub type Result<T> = std::result::Result<T, ServerError>;

/// Enum representing server-side errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("validation error occurred")]
    Validation(#[from] ValidationErrors),

    #[error("error parsing form data")]
    ParsingForm(Box<dyn std::error::Error + Send + Sync>),

    #[error(transparent)]
    Axum(#[from] JsonRejection),

    #[error("SQL request failed: {0}")]
    Sql(#[from] SQLxError),

    #[error("token is invalid or expired")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("missing or invalid access token")]
    Unauthorized,

    #[error("{0}")]
    NotFound(&'static str),

    #[error(transparent)]
    Crypto(#[from] crate::crypto::CryptoError),

    #[error(transparent)]
    Media(#[from] crate::media::MediaError),

    #[error("system clock is set before unix epoch")]
    Clock(#[from] std::time::SystemTimeError),

    #[error("internal server error, {details}")]
    Internal {
        details: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Uniform JSON envelope for failed requests.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseError {
    success: bool,
    data: Option<()>,
    status_code: u16,
    message: String,
    errors: Vec<FieldError>,
}

impl ResponseError {
    /// Update error status code.
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status_code = code.as_u16();
        self
    }

    /// Update `message` field.
    pub fn message(mut self, message: &str) -> Self {
        self.message = message.into();
        self
    }

    /// Automatically add errors field.
    pub fn errors(mut self, errors: &ValidationErrors) -> Self {
        self.errors = parse_validation_errors(errors);
        self
    }

    /// Transform [`ResponseError`] into axum [`Response`].
    pub fn into_response(
        self,
    ) -> std::result::Result<Response, axum::http::Error> {
        if let Ok(body) = serde_json::to_string(&self) {
            Response::builder()
                .status(self.status_code)
                .header(header::CONTENT_TYPE, "application/json")
                .body(body.into())
        } else {
            Ok(internal_server_error())
        }
    }
}

impl Default for ResponseError {
    fn default() -> Self {
        Self {
            success: false,
            data: None,
            status_code: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            message: "Internal server error.".to_owned(),
            errors: Vec::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct FieldError {
    field: String,
    message: String,
}

fn parse_validation_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, issues)| {
            issues.iter().map(move |issue| FieldError {
                field: field.to_string(),
                message: issue.to_string(),
            })
        })
        .collect()
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let response = ResponseError::default()
            .message(&self.to_string())
            .status(StatusCode::BAD_REQUEST);

        let response = match &self {
            ServerError::Validation(validation_errors) => {
                response.errors(validation_errors)
            },

            ServerError::ParsingForm(err) => response
                .message(&format!("Failed to parse form data: {err}.")),

            ServerError::Sql(err) => sql_error(response, err),

            ServerError::Jwt(_) => response
                .message("Token is invalid or expired.")
                .status(StatusCode::UNAUTHORIZED),

            ServerError::InvalidCredentials => response
                .message("Invalid credentials.")
                .status(StatusCode::UNAUTHORIZED),

            ServerError::Unauthorized => response
                .message("Missing or invalid access token.")
                .status(StatusCode::UNAUTHORIZED),

            ServerError::NotFound(message) => {
                response.message(message).status(StatusCode::NOT_FOUND)
            },

            ServerError::Media(err) => {
                tracing::error!(error = %err, "media host upload failed");
                ResponseError::default()
            },

            ServerError::Crypto(err) => {
                tracing::error!(error = %err, "cryptographic operation failed");
                ResponseError::default()
            },

            ServerError::Clock(err) => {
                tracing::error!(error = %err, "system clock is unusable");
                ResponseError::default()
            },

            ServerError::Internal { details, source } => {
                tracing::error!(
                    error = ?source,
                    %details,
                    "server returned 500 status"
                );

                ResponseError::default()
            },

            _ => response,
        };

        response
            .into_response()
            .unwrap_or_else(|_| internal_server_error())
    }
}

/// Hide raw store failures behind the envelope. Only constraint violations
/// and empty result sets are the client's business.
fn sql_error(response: ResponseError, err: &SQLxError) -> ResponseError {
    match err {
        SQLxError::RowNotFound => response
            .message("Resource not found.")
            .status(StatusCode::NOT_FOUND),
        err if err
            .as_database_error()
            .is_some_and(|db| db.is_unique_violation()) =>
        {
            response
                .message("Email or username already exists.")
                .status(StatusCode::BAD_REQUEST)
        },
        err => {
            tracing::error!(error = %err, "database request failed");
            ResponseError::default()
        },
    }
}

fn internal_server_error() -> Response {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "application/json")
        .body(
            serde_json::json!({
                "success": false,
                "data": null,
                "statusCode": StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                "message": "Internal server error.",
                "errors": [],
            })
            .to_string()
            .into(),
        )
        .unwrap_or_else(|_| Response::new("Internal server error".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_unauthorized_envelope() {
        let response = ServerError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["data"], serde_json::Value::Null);
        assert_eq!(body["statusCode"], 401);
        assert!(body["errors"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_validation_envelope_lists_fields() {
        let mut errors = ValidationErrors::new();
        errors.add(
            "email",
            validator::ValidationError::new("email")
                .with_message("Email provider is not supported.".into()),
        );

        let response = ServerError::Validation(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["errors"][0]["field"], "email");
    }
}
