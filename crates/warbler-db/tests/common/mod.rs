// Shared fixtures for warbler-db integration tests

use warbler_crypto::Argon2Hasher;
use warbler_db::{Database, User};

/// Fresh in-memory store with the schema applied.
pub fn setup_db() -> Database {
    Database::open_in_memory().expect("Failed to create test database")
}

/// Cheap Argon2 parameters so tests do not spend seconds hashing.
pub fn test_hasher() -> Argon2Hasher {
    Argon2Hasher::with_params(1024, 1).expect("Failed to build test hasher")
}

/// Persists two users built directly, bypassing signup.
pub fn two_users(db: &Database) -> (User, User) {
    let u1 = User::new("test@test.com", "testuser", "HASHED_PASSWORD");
    let u2 = User::new("test2@test.com", "test2user", "HASHED_PASSWORD2");

    let mut session = db.session();
    session.add_all_users([u1.clone(), u2.clone()]);
    session.commit().expect("Failed to commit users");

    (u1, u2)
}
