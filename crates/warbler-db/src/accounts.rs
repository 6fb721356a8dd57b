use tracing::{debug, info};
use warbler_crypto::CredentialHasher;

use crate::Database;
use crate::error::Result;
use crate::models::{DEFAULT_IMAGE_URL, User};
use crate::session::Session;

/// Hashes `password`, builds the user and stages it on `session`.
///
/// Nothing is written until the caller commits; a taken username or email
/// shows up then as `DbError::Integrity`.
pub fn signup(
    session: &mut Session<'_>,
    hasher: &dyn CredentialHasher,
    username: &str,
    email: &str,
    password: &str,
    image_url: Option<&str>,
) -> Result<User> {
    let hashed = hasher.hash(password)?;

    let mut user = User::new(email, username, hashed);
    user.image_url = image_url
        .filter(|url| !url.is_empty())
        .unwrap_or(DEFAULT_IMAGE_URL)
        .to_string();

    session.add_user(user.clone());
    debug!("Staged signup for {}", user);
    Ok(user)
}

/// Detailed result of a credential check. Callers facing the outside world
/// should go through `authenticate`, which folds both failures together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Authenticated(User),
    UnknownUser,
    WrongPassword,
}

pub fn check_credentials(
    db: &Database,
    hasher: &dyn CredentialHasher,
    username: &str,
    password: &str,
) -> Result<AuthOutcome> {
    let Some(user) = db.get_user_by_username(username)? else {
        return Ok(AuthOutcome::UnknownUser);
    };

    if hasher.verify(password, &user.password) {
        Ok(AuthOutcome::Authenticated(user))
    } else {
        Ok(AuthOutcome::WrongPassword)
    }
}

/// Returns the user only when the username exists and the password matches.
/// Unknown users and wrong passwords both yield `Ok(None)`.
pub fn authenticate(
    db: &Database,
    hasher: &dyn CredentialHasher,
    username: &str,
    password: &str,
) -> Result<Option<User>> {
    match check_credentials(db, hasher, username, password)? {
        AuthOutcome::Authenticated(user) => {
            info!("Authenticated {}", user.username);
            Ok(Some(user))
        }
        outcome => {
            debug!("Authentication failed for '{}': {:?}", username, outcome);
            Ok(None)
        }
    }
}
