//! Handle database requests.

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error::Result;
use crate::user::{ChannelProfile, NewUser, User};

const USER_COLUMNS: &str = "id, username, email, full_name, password, avatar, \
                            cover_image, refresh_token, created_at, updated_at";

#[derive(Clone)]
pub struct UserRepository {
    pool: Pool<Postgres>,
}

impl UserRepository {
    /// Create a new [`UserRepository`].
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert [`NewUser`] into database.
    ///
    /// The UNIQUE constraints on `username` and `email` close the window the
    /// advisory [`Self::is_taken`] pre-check leaves open.
    pub async fn insert(&self, user: &NewUser) -> Result<User> {
        let query = format!(
            r#"INSERT INTO users (username, email, full_name, password, avatar, cover_image)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING {USER_COLUMNS}"#
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.full_name)
            .bind(&user.password)
            .bind(&user.avatar)
            .bind(&user.cover_image)
            .fetch_one(&self.pool)
            .await?;

        Ok(user)
    }

    /// Find current user using `id` field.
    pub async fn find_by_id(&self, user_id: Uuid) -> Result<User> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        let user = sqlx::query_as::<_, User>(&query)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(user)
    }

    /// Find a user matching a lowercased username or an email address.
    pub async fn find_by_login(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>> {
        let query = format!(
            r#"SELECT {USER_COLUMNS} FROM users
                WHERE ($1::text IS NOT NULL AND username = $1)
                   OR ($2::text IS NOT NULL AND email = $2)"#
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(username.map(str::to_lowercase))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Advisory uniqueness pre-check for registration.
    pub async fn is_taken(&self, username: &str, email: &str) -> Result<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS (
                SELECT 1 FROM users WHERE username = $1 OR email = $2
            )"#,
        )
        .bind(username)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(taken)
    }

    /// Replace or clear the single stored refresh token.
    pub async fn set_refresh_token(
        &self,
        user_id: Uuid,
        token: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"UPDATE users SET refresh_token = $1, updated_at = NOW()
                WHERE id = $2"#,
        )
        .bind(token)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Replace the stored password hash.
    pub async fn set_password(&self, user_id: Uuid, phc: &str) -> Result<()> {
        sqlx::query(
            r#"UPDATE users SET password = $1, updated_at = NOW()
                WHERE id = $2"#,
        )
        .bind(phc)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Update account details of current user.
    pub async fn update_account(
        &self,
        user_id: Uuid,
        username: &str,
        full_name: &str,
        email: &str,
    ) -> Result<User> {
        let query = format!(
            r#"UPDATE users
                SET username = $1, full_name = $2, email = $3, updated_at = NOW()
                WHERE id = $4
                RETURNING {USER_COLUMNS}"#
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(username.to_lowercase())
            .bind(full_name)
            .bind(email)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(user)
    }

    /// Replace the avatar URL, leaving every other field untouched.
    pub async fn set_avatar(&self, user_id: Uuid, url: &str) -> Result<User> {
        let query = format!(
            r#"UPDATE users SET avatar = $1, updated_at = NOW()
                WHERE id = $2
                RETURNING {USER_COLUMNS}"#
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(url)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(user)
    }

    /// Replace the cover image URL, leaving every other field untouched.
    pub async fn set_cover_image(
        &self,
        user_id: Uuid,
        url: &str,
    ) -> Result<User> {
        let query = format!(
            r#"UPDATE users SET cover_image = $1, updated_at = NOW()
                WHERE id = $2
                RETURNING {USER_COLUMNS}"#
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(url)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(user)
    }

    /// Channel profile aggregation.
    ///
    /// One round trip: match the lowercased username, count subscriptions
    /// where the user is the channel and where the user is the subscriber,
    /// and test whether `viewer` is among the channel's subscribers. An
    /// unknown username yields `None`, never an empty placeholder row.
    pub async fn channel_profile(
        &self,
        username: &str,
        viewer: Option<Uuid>,
    ) -> Result<Option<ChannelProfile>> {
        let profile = sqlx::query_as::<_, ChannelProfile>(
            r#"SELECT
                    u.username,
                    u.full_name,
                    u.email,
                    u.avatar,
                    u.cover_image,
                    (SELECT COUNT(*) FROM subscriptions s
                        WHERE s.channel_id = u.id) AS subscriber_count,
                    (SELECT COUNT(*) FROM subscriptions s
                        WHERE s.subscriber_id = u.id) AS subscribed_to_count,
                    EXISTS (SELECT 1 FROM subscriptions s
                        WHERE s.channel_id = u.id
                          AND s.subscriber_id = $2) AS is_subscribed
                FROM users u
                WHERE u.username = $1"#,
        )
        .bind(username.to_lowercase())
        .bind(viewer)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }
}
