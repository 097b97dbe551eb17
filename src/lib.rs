//! vidtube is a minimal account and channel backend for a video sharing
//! platform.

#![forbid(unsafe_code)]

mod crypto;
mod database;
pub mod error;
mod media;
mod middleware;
mod router;
mod token;
mod user;

pub mod config;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::http::{Method, header};
use axum::routing::{get, post};
use axum::Router;
pub use error::ServerError;
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::cors::{Any, CorsLayer};
use tower_http::sensitive_headers::SetSensitiveHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};

/// Upper bound for multipart uploads.
const UPLOAD_LIMIT: usize = 8 * 1024 * 1024;

/// MUST NEVER be used in production.
#[cfg(test)]
pub async fn make_request(
    app: Router,
    method: Method,
    path: &str,
    body: String,
) -> axum::http::Response<axum::body::Body> {
    use axum::extract::Request;
    use tower::util::ServiceExt;

    app.oneshot(
        Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from(body))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// State sharing between routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Configuration>,
    pub db: database::Database,
    pub users: user::UserService,
    pub token: token::TokenManager,
    pub media: media::MediaManager,
}

/// Create router.
pub fn app(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        // Add high level tracing/logging to all requests.
        .layer(
            TraceLayer::new_for_http()
                .on_body_chunk(|chunk: &Bytes, latency: Duration, _span: &tracing::Span| {
                    tracing::trace!(size_bytes = chunk.len(), latency = ?latency, "sending body chunk")
                })
                .make_span_with(DefaultMakeSpan::new().include_headers(true).level(tracing::Level::INFO))
                .on_request(DefaultOnRequest::new())
                .on_response(DefaultOnResponse::new().include_headers(true).latency_unit(LatencyUnit::Micros)),
        )
        // Set a timeout.
        .layer(TimeoutLayer::new(Duration::from_secs(10)))
        // Remove sensitive headers from trace.
        .layer(SetSensitiveHeadersLayer::new([
            header::AUTHORIZATION,
            header::COOKIE,
        ]))
        // Add CORS preflight support.
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers(Any)
                .vary([header::AUTHORIZATION]),
        );

    Router::new()
        // `POST /register` creates an account. Multipart, avatar required.
        .route("/register", post(router::register::handler))
        // `POST /login` issues the token pair and session cookies.
        .route("/login", post(router::login::handler))
        // `POST /refresh-token` renews an access token.
        .route("/refresh-token", post(router::refresh_token::handler))
        // `GET /channel/{username}` is the public channel profile.
        .route("/channel/{username}", get(router::channel::handler))
        // Token-protected account routes.
        .merge(router::users::router(state.clone()))
        .layer(DefaultBodyLimit::max(UPLOAD_LIMIT))
        .with_state(state)
        .layer(middleware)
}

/// Initialize the application state.
pub async fn initialize_state() -> Result<AppState, Box<dyn std::error::Error>>
{
    // read configuration file. let it in memory.
    let config = config::Configuration::default().read()?;

    let db = match config.postgres {
        Some(ref config) => {
            database::Database::new(
                &config.address,
                &config
                    .username
                    .clone()
                    .unwrap_or(database::DEFAULT_CREDENTIALS.into()),
                &config
                    .password
                    .clone()
                    .unwrap_or(database::DEFAULT_CREDENTIALS.into()),
                &config
                    .database
                    .clone()
                    .unwrap_or(database::DEFAULT_DATABASE_NAME.into()),
                config.pool_size.unwrap_or(database::DEFAULT_POOL_SIZE),
            )
            .await?
        },
        None => {
            tracing::error!("missing `postgres` entry on `config.yaml` file");
            std::process::exit(0);
        },
    };

    // execute migrations scripts on start.
    sqlx::migrate!().run(&db.postgres).await?;

    let crypto =
        Arc::new(crypto::PasswordManager::new(config.argon2.clone())?);

    // handle jwt.
    let Some(token_config) = &config.token else {
        tracing::warn!("missing `token` entry on `config.yaml` file");
        std::process::exit(0);
    };
    let mut token = token::TokenManager::new(
        &config.name,
        &token_config.access_secret,
        &token_config.refresh_secret,
    );
    token.expirations(
        token_config.access_expiration,
        token_config.refresh_expiration,
    );
    token.audience(token_config.audience.as_deref().unwrap_or(&config.url));

    // handle media host.
    let media = match &config.media {
        Some(cfg) => media::MediaManager::new(cfg),
        None => {
            tracing::warn!(
                "missing `media` entry on `config.yaml` file, uploads disabled"
            );
            media::MediaManager::default()
        },
    };

    let users = user::UserService::new(
        db.postgres.clone(),
        Arc::clone(&crypto),
        token.clone(),
    );

    Ok(AppState {
        config,
        db,
        users,
        token,
        media,
    })
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};

    use super::*;

    #[tokio::test]
    async fn test_protected_route_without_token_is_unauthorized() {
        let app = app(router::state());

        let response =
            make_request(app, Method::POST, "/get-user", String::default())
                .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_protected_route_with_garbage_token_is_unauthorized() {
        use axum::extract::Request;
        use tower::util::ServiceExt;

        let app = app(router::state());

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/change-password")
                    .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
