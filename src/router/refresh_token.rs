//! Get a new access token with a refresh token.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::{Result, ServerError};
use crate::middleware::{ACCESS_COOKIE, REFRESH_COOKIE, bearer};
use crate::router::{ApiResponse, secure_cookie};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Data {
    pub access_token: String,
}

/// Handler to renew an access token.
///
/// The refresh token is read from the cookie first, then the request body,
/// then the `Authorization` header. The body is optional, so it is parsed
/// best-effort rather than through the JSON extractor.
pub async fn handler(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(CookieJar, ApiResponse<Data>)> {
    let body: Body = serde_json::from_slice(&body).unwrap_or_default();

    let presented = jar
        .get(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_owned())
        .or(body.refresh_token)
        .or_else(|| bearer(&headers))
        .ok_or(ServerError::Unauthorized)?;

    let access_token = state.users.refresh_access(&presented).await?;

    let jar = jar.add(secure_cookie(ACCESS_COOKIE, access_token.clone()));

    Ok((
        jar,
        ApiResponse::new(
            StatusCode::OK,
            Data { access_token },
            "Access token refreshed successfully.",
        ),
    ))
}

#[cfg(test)]
mod tests {
    use axum::body::Body as HttpBody;
    use axum::http::{Method, Request, StatusCode, header};
    use serde_json::json;
    use tower::util::ServiceExt;

    use crate::{app, router};

    async fn refresh(
        cookie: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> axum::http::Response<axum::body::Body> {
        let app = app(router::state());

        let mut request = Request::builder()
            .method(Method::POST)
            .uri("/refresh-token")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }

        let body = body.map(|b| b.to_string()).unwrap_or_default();
        app.oneshot(request.body(HttpBody::from(body)).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_missing_token_everywhere_is_unauthorized() {
        let response = refresh(None, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_garbage_cookie_token_is_unauthorized() {
        let response = refresh(Some("refreshToken=not-a-jwt"), None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_garbage_body_token_is_unauthorized() {
        let response =
            refresh(None, Some(json!({ "refreshToken": "not-a-jwt" }))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_foreign_family_token_is_unauthorized() {
        // An access token signed with the access secret must never pass the
        // refresh verification.
        let state = router::state();
        let user = crate::user::User {
            id: uuid::Uuid::new_v4(),
            username: "chai".to_owned(),
            email: "chai@gmail.com".to_owned(),
            full_name: "Chai Aur Code".to_owned(),
            avatar: "https://media.example.com/a.png".to_owned(),
            cover_image: None,
            password: String::default(),
            refresh_token: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        let access = state.token.create_access(&user).unwrap();

        let response = app(state)
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/refresh-token")
                    .header(header::COOKIE, format!("refreshToken={access}"))
                    .body(HttpBody::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
