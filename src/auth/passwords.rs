//! Argon2id password hashing.
//!
//! The async entry points run on tokio's blocking pool; each hash holds
//! ~19 MiB for tens of milliseconds.

use argon2::password_hash::{self, SaltString};
use argon2::{
    Algorithm, Argon2, ParamsBuilder, PasswordHash, PasswordHasher, PasswordVerifier, Version,
};
use rand::RngCore;

use crate::auth::{AuthError, AuthResult};

const SALT_LEN: usize = 16;
const MEMORY_COST_KIB: u32 = 19 * 1024;
const TIME_COST: u32 = 2;

#[derive(Clone)]
pub struct PasswordService {
    argon2: Argon2<'static>,
}

impl PasswordService {
    pub fn new() -> AuthResult<Self> {
        let params = ParamsBuilder::new()
            .m_cost(MEMORY_COST_KIB)
            .t_cost(TIME_COST)
            .p_cost(1)
            .build()?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Produce a PHC-format hash string for storage.
    pub fn hash_sync(&self, password: &str) -> AuthResult<String> {
        let mut salt_bytes = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt_bytes);
        let salt = SaltString::encode_b64(&salt_bytes)?;
        Ok(self
            .argon2
            .hash_password(password.as_bytes(), &salt)?
            .to_string())
    }

    pub fn verify_sync(&self, password: &str, stored_hash: &str) -> AuthResult<bool> {
        let parsed = PasswordHash::new(stored_hash)?;
        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn hash_password(&self, password: String) -> AuthResult<String> {
        let service = self.clone();
        tokio::task::spawn_blocking(move || service.hash_sync(&password))
            .await
            .map_err(|err| AuthError::PasswordHash(format!("hashing task failed: {err}")))?
    }

    pub async fn verify_password(&self, password: String, stored_hash: String) -> AuthResult<bool> {
        let service = self.clone();
        tokio::task::spawn_blocking(move || service.verify_sync(&password, &stored_hash))
            .await
            .map_err(|err| AuthError::PasswordHash(format!("verification task failed: {err}")))?
    }
}
