use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::{SaltString, rand_core::OsRng},
};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("invalid argon2 parameters: {0}")]
    Params(String),
}

/// Opaque hash/verify capability used by signup and login.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, secret: &str) -> Result<String, CryptoError>;

    /// Returns false for a mismatch and for a digest that cannot be parsed.
    fn verify(&self, secret: &str, digest: &str) -> bool;
}

#[derive(Clone, Default)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    /// Argon2id with explicit memory (KiB) and iteration costs.
    pub fn with_params(m_cost: u32, t_cost: u32) -> Result<Self, CryptoError> {
        let params =
            Params::new(m_cost, t_cost, 1, None).map_err(|e| CryptoError::Params(e.to_string()))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, secret: &str) -> Result<String, CryptoError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|e| CryptoError::Hash(e.to_string()))?;
        Ok(hash.to_string())
    }

    fn verify(&self, secret: &str, digest: &str) -> bool {
        let parsed = match PasswordHash::new(digest) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Stored password is not a valid PHC string: {}", e);
                return false;
            }
        };

        self.argon2
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok()
    }
}
