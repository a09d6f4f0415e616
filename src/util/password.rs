use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

pub const SALT_BYTES: usize = 32;

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("could not read from the entropy source : {0}")]
    Entropy(getrandom::Error),
    #[error("error hashing password : {0}")]
    Hash(argon2::password_hash::Error),
}

/// 32 random bytes from the OS entropy source. Failure here is fatal for the
/// calling flow.
pub fn generate_salt() -> Result<Vec<u8>, PasswordError> {
    let mut salt = [0u8; SALT_BYTES];
    getrandom::getrandom(&mut salt).map_err(PasswordError::Entropy)?;
    Ok(salt.to_vec())
}

/// Hashes with argon2 default parameters, using the account's stored salt as
/// the argon2 salt. Returns a PHC-encoded string.
pub fn hash_password(password: &str, salt: &[u8]) -> Result<String, PasswordError> {
    let salt_string = SaltString::encode_b64(salt).map_err(PasswordError::Hash)?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt_string)
        .map_err(PasswordError::Hash)?;
    Ok(hash.to_string())
}

/// Constant-time verification. Any internal error counts as a mismatch.
pub fn compare_password(password: &str, stored_hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(stored_hash) {
        Ok(hash) => hash,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}
