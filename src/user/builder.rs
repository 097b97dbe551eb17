//! Typed builder for NewUser.

use crate::user::NewUser;

/// [`NewUser`] builder.
///
/// `username` and `email` are tracked at the type level so a half-built
/// registration cannot reach the repository.
#[derive(Debug, Clone)]
pub struct UserBuilder<Username, Email> {
    username: Username,
    email: Email,
    full_name: String,
    password: String,
    avatar: String,
    cover_image: Option<String>,
}

/// Value is missing on [`UserBuilder`].
#[derive(Debug, Clone)]
pub struct Missing;

/// Value is present on [`UserBuilder`].
#[derive(Debug, Clone)]
pub struct Present(pub String);

impl UserBuilder<Missing, Missing> {
    /// Create a new [`UserBuilder`].
    pub fn new() -> Self {
        Self {
            username: Missing,
            email: Missing,
            full_name: String::default(),
            password: String::default(),
            avatar: String::default(),
            cover_image: None,
        }
    }
}

impl Default for UserBuilder<Missing, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Email> UserBuilder<Missing, Email> {
    /// Update `username` field on [`UserBuilder`]. Lowercased on entry.
    pub fn username(
        self,
        username: impl Into<String>,
    ) -> UserBuilder<Present, Email> {
        UserBuilder {
            username: Present(username.into().to_lowercase()),
            email: self.email,
            full_name: self.full_name,
            password: self.password,
            avatar: self.avatar,
            cover_image: self.cover_image,
        }
    }
}

impl<Username> UserBuilder<Username, Missing> {
    /// Update `email` field on [`UserBuilder`].
    pub fn email(
        self,
        email: impl Into<String>,
    ) -> UserBuilder<Username, Present> {
        UserBuilder {
            username: self.username,
            email: Present(email.into()),
            full_name: self.full_name,
            password: self.password,
            avatar: self.avatar,
            cover_image: self.cover_image,
        }
    }
}

impl<Username, Email> UserBuilder<Username, Email> {
    /// Update `full_name` field on [`UserBuilder`].
    pub fn full_name(mut self, full_name: impl ToString) -> Self {
        self.full_name = full_name.to_string();
        self
    }

    /// Update `password` field on [`UserBuilder`].
    pub fn password(mut self, password: impl ToString) -> Self {
        self.password = password.to_string();
        self
    }

    /// Update `avatar` field on [`UserBuilder`].
    pub fn avatar(mut self, avatar: impl ToString) -> Self {
        self.avatar = avatar.to_string();
        self
    }

    /// Update `cover_image` field on [`UserBuilder`].
    pub fn cover_image(mut self, cover_image: Option<String>) -> Self {
        self.cover_image = cover_image;
        self
    }
}

impl UserBuilder<Present, Present> {
    /// Build a [`NewUser`] once both identifiers are present.
    pub fn build(self) -> NewUser {
        NewUser {
            username: self.username.0,
            email: self.email.0,
            full_name: self.full_name,
            password: self.password,
            avatar: self.avatar,
            cover_image: self.cover_image,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_lowercases_username() {
        let user = UserBuilder::new()
            .username("ChaiAurCode")
            .email("chai@gmail.com")
            .full_name("Chai Aur Code")
            .password("hashed")
            .avatar("https://media.example.com/a.png")
            .build();

        assert_eq!(user.username, "chaiaurcode");
        assert_eq!(user.email, "chai@gmail.com");
        assert_eq!(user.cover_image, None);
    }
}
