use argon2::password_hash::{
    self, rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};

use crate::config::PasswordConfig;
use crate::error::{FeedError, FeedResult};

/// One-way password hashing with a fixed cost.
///
/// Hashing is CPU-bound. Async callers should run it on a blocking thread.
pub trait PasswordHasher: Send + Sync {
    /// Hash `plaintext` into a self-describing digest.
    fn hash(&self, plaintext: &str) -> FeedResult<String>;

    /// Check `plaintext` against a digest produced by [`Self::hash`].
    fn verify(&self, plaintext: &str, digest: &str) -> FeedResult<bool>;
}

/// Argon2id hasher producing PHC strings.
#[derive(Clone, Debug)]
pub struct Argon2PasswordHasher {
    params: Params,
}

impl Argon2PasswordHasher {
    pub fn new(config: &PasswordConfig) -> FeedResult<Self> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| FeedError::Internal(format!("invalid argon2 parameters: {e}")))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, plaintext: &str) -> FeedResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| FeedError::Internal(format!("password hashing failed: {e}")))
    }

    fn verify(&self, plaintext: &str, digest: &str) -> FeedResult<bool> {
        let parsed = PasswordHash::new(digest)
            .map_err(|e| FeedError::Internal(format!("malformed password digest: {e}")))?;
        match self.argon2().verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(FeedError::Internal(format!("password verification failed: {e}"))),
        }
    }
}
