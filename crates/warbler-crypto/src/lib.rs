/// Warbler Crypto Library
///
/// Credential hashing for user passwords. Digests are Argon2id PHC strings,
/// so the salt and cost parameters travel with the stored hash.

pub mod hasher;

pub use hasher::{Argon2Hasher, CredentialHasher, CryptoError};
