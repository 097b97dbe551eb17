//! Manage json web tokens.

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::user::User;

const DEFAULT_AUDIENCE: &str = "vidtube.example.com";
/// Access tokens are short-lived. 15 minutes.
pub const ACCESS_EXPIRATION_TIME: u64 = 60 * 15;
/// Refresh tokens are long-lived. 10 days.
pub const REFRESH_EXPIRATION_TIME: u64 = 60 * 60 * 24 * 10;

/// Pieces of information asserted on a JWT.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Claims {
    /// Recipients that the JWT is intended for.
    pub aud: String,
    /// Identifies the expiration time on or after which the JWT must not be
    /// accepted for processing.
    pub exp: u64,
    /// Identifies the time at which the JWT was issued.
    #[serde(rename = "iat")]
    pub iat: u64,
    /// Identifies the organization that issued the JWT.
    pub iss: String,
    /// User ID.
    pub sub: String,
    /// Username hint, asserted on access tokens only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
}

/// Manage access and refresh JWT tokens.
///
/// The two families are signed with distinct secrets, so a refresh token can
/// never pass for an access token and vice versa.
#[derive(Clone)]
pub struct TokenManager {
    algorithm: Algorithm,
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_expiration: u64,
    refresh_expiration: u64,
    name: String,
    audience: String,
}

impl TokenManager {
    /// Create a new [`TokenManager`] instance.
    pub fn new(name: &str, access_secret: &str, refresh_secret: &str) -> Self {
        Self {
            algorithm: Algorithm::HS256,
            access_encoding: EncodingKey::from_secret(access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(
                refresh_secret.as_bytes(),
            ),
            refresh_decoding: DecodingKey::from_secret(
                refresh_secret.as_bytes(),
            ),
            access_expiration: ACCESS_EXPIRATION_TIME,
            refresh_expiration: REFRESH_EXPIRATION_TIME,
            name: name.to_owned(),
            audience: DEFAULT_AUDIENCE.to_string(),
        }
    }

    /// Set `audience` field on JWT.
    pub fn audience(&mut self, audience: &str) {
        self.audience = audience.to_owned();
    }

    /// Override token lifetimes, in seconds.
    pub fn expirations(&mut self, access: Option<u64>, refresh: Option<u64>) {
        if let Some(access) = access {
            self.access_expiration = access;
        }
        if let Some(refresh) = refresh {
            self.refresh_expiration = refresh;
        }
    }

    fn claims(&self, sub: String, expiration: u64) -> Result<Claims> {
        let time = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();

        Ok(Claims {
            aud: self.audience.clone(),
            exp: time + expiration,
            iat: time,
            iss: self.name.clone(),
            sub,
            preferred_username: None,
        })
    }

    /// Create a new short-lived access token for a user.
    pub fn create_access(&self, user: &User) -> Result<String> {
        let header = Header::new(self.algorithm);
        let mut claims =
            self.claims(user.id.to_string(), self.access_expiration)?;
        claims.preferred_username = Some(user.username.clone());

        Ok(encode(&header, &claims, &self.access_encoding)?)
    }

    /// Create a new long-lived refresh token for a user.
    pub fn create_refresh(&self, user_id: Uuid) -> Result<String> {
        let header = Header::new(self.algorithm);
        let claims = self.claims(user_id.to_string(), self.refresh_expiration)?;

        Ok(encode(&header, &claims, &self.refresh_encoding)?)
    }

    /// Decode and check an access token.
    pub fn decode_access(&self, token: &str) -> Result<Claims> {
        self.decode(token, &self.access_decoding)
    }

    /// Decode and check a refresh token.
    pub fn decode_refresh(&self, token: &str) -> Result<Claims> {
        self.decode(token, &self.refresh_decoding)
    }

    fn decode(&self, token: &str, key: &DecodingKey) -> Result<Claims> {
        let mut validation = Validation::new(self.algorithm);
        validation.set_audience(&[&self.audience]);

        Ok(decode::<Claims>(token, key, &validation)?.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "chai".to_owned(),
            email: "chai@gmail.com".to_owned(),
            full_name: "Chai Aur Code".to_owned(),
            avatar: "https://media.example.com/avatar.png".to_owned(),
            cover_image: None,
            password: String::default(),
            refresh_token: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_access_token_round_trip() {
        let manager = TokenManager::new("vidtube", "access-key", "refresh-key");
        let user = user();

        let token = manager.create_access(&user).unwrap();
        let claims = manager.decode_access(&token).unwrap();

        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.preferred_username.as_deref(), Some("chai"));
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_refresh_token_round_trip() {
        let manager = TokenManager::new("vidtube", "access-key", "refresh-key");
        let id = Uuid::new_v4();

        let token = manager.create_refresh(id).unwrap();
        let claims = manager.decode_refresh(&token).unwrap();

        assert_eq!(claims.sub, id.to_string());
        assert_eq!(claims.preferred_username, None);
    }

    #[test]
    fn test_families_do_not_cross_verify() {
        let manager = TokenManager::new("vidtube", "access-key", "refresh-key");
        let user = user();

        let access = manager.create_access(&user).unwrap();
        let refresh = manager.create_refresh(user.id).unwrap();

        assert!(manager.decode_refresh(&access).is_err());
        assert!(manager.decode_access(&refresh).is_err());
    }

    #[test]
    fn test_foreign_secret_is_rejected() {
        let ours = TokenManager::new("vidtube", "access-key", "refresh-key");
        let theirs = TokenManager::new("vidtube", "other-key", "refresh-key");

        let token = theirs.create_access(&user()).unwrap();
        assert!(ours.decode_access(&token).is_err());
    }
}
