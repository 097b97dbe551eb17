//! Credential and account lifecycle operations.

use std::sync::Arc;

use sqlx::{Pool, Postgres};
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::crypto::PasswordManager;
use crate::error::{Result, ServerError};
use crate::token::TokenManager;
use crate::user::{NewUser, User, UserRepository};

/// Access and refresh token pair issued at login.
#[derive(Clone, Debug)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// User manager.
///
/// One stored refresh token per user: issuing a new pair replaces the old
/// session, logging out ends it.
#[derive(Clone)]
pub struct UserService {
    pub repo: UserRepository,
    crypto: Arc<PasswordManager>,
    token: TokenManager,
}

impl UserService {
    /// Create a new [`UserService`].
    pub fn new(
        pool: Pool<Postgres>,
        crypto: Arc<PasswordManager>,
        token: TokenManager,
    ) -> Self {
        Self {
            repo: UserRepository::new(pool),
            crypto,
            token,
        }
    }

    /// Hash the candidate password and insert the user.
    pub async fn register(&self, mut user: NewUser) -> Result<User> {
        user.password = self.crypto.hash_password(&user.password)?;
        self.repo.insert(&user).await
    }

    /// Salted hash comparison against the stored PHC string.
    pub fn verify_password(
        &self,
        user: &User,
        candidate: &str,
    ) -> Result<bool> {
        Ok(self.crypto.verify_password(candidate, &user.password)?)
    }

    /// Sign an access and refresh token pair and persist the refresh token
    /// on the user record.
    ///
    /// The persistence step is a bare column update; the record went through
    /// full validation when it was created.
    pub async fn issue_tokens(&self, user_id: Uuid) -> Result<TokenPair> {
        let issue = async {
            let user = self.repo.find_by_id(user_id).await?;

            let access = self.token.create_access(&user)?;
            let refresh = self.token.create_refresh(user.id)?;
            self.repo.set_refresh_token(user.id, Some(&refresh)).await?;

            Ok::<_, ServerError>(TokenPair { access, refresh })
        };

        issue.await.map_err(|err| ServerError::Internal {
            details: "failed to issue session tokens".into(),
            source: Some(Box::new(err)),
        })
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// The presented token must verify against the refresh secret and
    /// byte-match the stored one. A token left over from before a logout or
    /// a later login fails closed. The stored token is not rotated here.
    pub async fn refresh_access(&self, presented: &str) -> Result<String> {
        let claims = self.token.decode_refresh(presented)?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ServerError::Unauthorized)?;

        let user = self
            .repo
            .find_by_id(user_id)
            .await
            .map_err(|_| ServerError::Unauthorized)?;

        match user.refresh_token.as_deref() {
            Some(stored) if stored == presented => {},
            _ => return Err(ServerError::Unauthorized),
        }

        self.token.create_access(&user)
    }

    /// End the active session by clearing the stored refresh token.
    pub async fn logout(&self, user_id: Uuid) -> Result<()> {
        self.repo.set_refresh_token(user_id, None).await
    }

    /// Verify the old password, then hash and store the new one.
    pub async fn change_password(
        &self,
        user: &User,
        old_password: &str,
        new_password: &str,
    ) -> Result<()> {
        if !self.verify_password(user, old_password)? {
            return Err(invalid_old_password().into());
        }

        let phc = self.crypto.hash_password(new_password)?;
        self.repo.set_password(user.id, &phc).await
    }
}

fn invalid_old_password() -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(
        "oldPassword",
        ValidationError::new("old_password")
            .with_message("Invalid old password.".into()),
    );
    errors
}
