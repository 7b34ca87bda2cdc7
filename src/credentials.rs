use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

/// HashingCost
///
/// The Argon2 work factor applied when hashing a new password. The parameters are
/// recorded inside the resulting PHC string, so verification never needs them:
/// raising the cost only affects passwords hashed after the change.
#[derive(Debug, Clone, PartialEq)]
pub struct HashingCost {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of passes over the memory.
    pub iterations: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
}

impl Default for HashingCost {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// CredentialError
///
/// Failure to produce a password hash. Verification deliberately has no error
/// type: any failure there resolves to "not verified".
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("invalid hashing parameters: {0}")]
    Params(argon2::Error),
    #[error("failed to hash password: {0}")]
    Hash(argon2::password_hash::Error),
}

/// hash_password
///
/// Produces an Argon2id PHC-format hash of `password` with a fresh random salt.
/// The raw password is never stored or logged; the returned string is the only
/// credential material the persistence layer ever sees.
pub fn hash_password(password: &str, cost: &HashingCost) -> Result<String, CredentialError> {
    let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
        .map_err(CredentialError::Params)?;
    let hasher = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let salt = SaltString::generate(&mut OsRng);
    let hash = hasher
        .hash_password(password.as_bytes(), &salt)
        .map_err(CredentialError::Hash)?;

    Ok(hash.to_string())
}

/// verify_password
///
/// Recomputes the hash of `password` under the parameters and salt embedded in
/// `stored_hash` and compares in constant time.
///
/// Fails closed: a malformed or truncated stored hash returns `false` rather
/// than an error, so no caller can accidentally treat a hashing failure as a
/// successful authentication.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
