//! Entity types. These are plain snapshots of rows; every query or write goes
//! through an explicit `Database` or `Session` handle.

use std::fmt;

use chrono::{DateTime, SubsecRound, Utc};
use uuid::Uuid;

use crate::Database;
use crate::error::Result;

pub const DEFAULT_IMAGE_URL: &str = "/static/images/default-pic.png";
pub const DEFAULT_HEADER_IMAGE_URL: &str = "/static/images/warbler-hero.jpg";

/// Upper bound on message text, in characters.
pub const MAX_MESSAGE_LEN: usize = 140;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    /// Argon2 PHC string when created through `signup`.
    pub password: String,
    pub image_url: String,
    pub header_image_url: String,
    pub bio: Option<String>,
    pub location: Option<String>,
}

impl User {
    /// Builds a user with a fresh id and default images. `password` is stored
    /// as given; use `accounts::signup` to hash it.
    pub fn new(email: impl Into<String>, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            username: username.into(),
            password: password.into(),
            image_url: DEFAULT_IMAGE_URL.to_string(),
            header_image_url: DEFAULT_HEADER_IMAGE_URL.to_string(),
            bio: None,
            location: None,
        }
    }

    /// Whether this user follows `other`.
    pub fn is_following(&self, db: &Database, other: &User) -> Result<bool> {
        db.is_following(self.id, other.id)
    }

    /// Whether `other` follows this user.
    pub fn is_followed_by(&self, db: &Database, other: &User) -> Result<bool> {
        db.is_following(other.id, self.id)
    }

    /// Messages owned by this user, newest first.
    pub fn messages(&self, db: &Database) -> Result<Vec<Message>> {
        db.get_user_messages(self.id, None)
    }

    pub fn followers(&self, db: &Database) -> Result<Vec<User>> {
        db.get_followers(self.id)
    }

    pub fn following(&self, db: &Database) -> Result<Vec<User>> {
        db.get_following(self.id)
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<User #{}: {}, {}>", self.id, self.username, self.email)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: Uuid,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub user_id: Uuid,
}

impl Message {
    /// Stamps the message with the current time at the microsecond precision
    /// the store keeps.
    pub fn new(text: impl Into<String>, user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            timestamp: Utc::now().trunc_subsecs(6),
            user_id,
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Message #{} by user #{}: {}>", self.id, self.user_id, self.text)
    }
}

/// Directed follow edge: `user_following_id` follows `user_being_followed_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Follows {
    pub user_being_followed_id: Uuid,
    pub user_following_id: Uuid,
}

impl Follows {
    pub fn new(follower_id: Uuid, followee_id: Uuid) -> Self {
        Self {
            user_being_followed_id: followee_id,
            user_following_id: follower_id,
        }
    }
}
