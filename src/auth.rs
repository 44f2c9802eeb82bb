use crate::error::{Error, Result};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;

/// Longest plaintext accepted for hashing, in bytes.
pub const MAX_PASSWORD_LEN: usize = 128;

/// One-way password hashing and verification with Argon2id.
#[derive(Clone)]
pub struct Credentials {
    params: Params,
}

impl Credentials {
    /// Build a verifier with the given cost: memory in KiB and iteration count.
    pub fn new(memory_kib: u32, iterations: u32) -> Result<Self> {
        let params = Params::new(memory_kib, iterations, Params::DEFAULT_P_COST, None)
            .map_err(|e| Error::Config(format!("invalid hash cost: {}", e)))?;
        Ok(Self { params })
    }

    fn hasher(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a plaintext password into a PHC string.
    pub fn hash(&self, plaintext: &str) -> Result<String> {
        if plaintext.is_empty() {
            return Err(Error::Hash("password is empty".to_string()));
        }
        if plaintext.len() > MAX_PASSWORD_LEN {
            return Err(Error::Hash(format!(
                "password is longer than {} bytes",
                MAX_PASSWORD_LEN
            )));
        }

        let salt = SaltString::generate(&mut OsRng);
        self.hasher()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| {
                tracing::error!("Unable to hash the password: {}", e);
                Error::Hash(e.to_string())
            })
    }

    /// Check a plaintext against a stored hash. A malformed hash and a wrong
    /// password both come back as `Unauthenticated`.
    pub fn verify(&self, hash: &str, plaintext: &str) -> Result<()> {
        let parsed = PasswordHash::new(hash).map_err(|e| {
            tracing::error!("Stored password hash is malformed: {}", e);
            Error::Unauthenticated
        })?;

        self.hasher()
            .verify_password(plaintext.as_bytes(), &parsed)
            .map_err(|_| Error::Unauthenticated)
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}
