use anyhow::{Result, anyhow};
use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};

/// One-way hashing of report access codes (and user passwords) with Argon2id.
///
/// Hashes are PHC strings, so the parameters and salt travel with the digest
/// and verification does not depend on how this hasher was configured.
#[derive(Clone, Default)]
pub struct CodeHasher {
    argon2: Argon2<'static>,
}

impl CodeHasher {
    /// Argon2id with the crate's default cost parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Argon2id with explicit memory (KiB), iteration and lane counts.
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|e| anyhow!("Invalid Argon2 params: {}", e))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    pub fn hash(&self, code: &str) -> Result<String> {
        let salt = SaltString::encode_b64(&rand::random::<[u8; 16]>())
            .map_err(|e| anyhow!("Salt encoding failed: {}", e))?;
        let hash = self
            .argon2
            .hash_password(code.as_bytes(), &salt)
            .map_err(|e| anyhow!("Hashing failed: {}", e))?;
        Ok(hash.to_string())
    }

    /// Fails closed: a malformed, foreign or corrupted hash is just `false`.
    pub fn verify(&self, code: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        self.argon2
            .verify_password(code.as_bytes(), &parsed)
            .is_ok()
    }
}
