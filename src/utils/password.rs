// Password hashing and verification using Argon2id

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};
use thiserror::Error;

/// Errors that can occur during password operations
#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashingError(String),

    #[error("Failed to verify password: {0}")]
    VerificationError(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,

    #[error("Memory cost ({0} KiB) exceeds safe limit ({1} KiB) - risk of out-of-memory error")]
    MemoryCostTooHigh(u32, u32),
}

/// Hashing seam used by the auth endpoint
pub trait PasswordHasher: Send + Sync {
    /// Produce a PHC string for the plaintext password
    fn hash(&self, password: &str) -> Result<String, PasswordError>;

    /// Check a plaintext password against a stored hash
    fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError>;

    /// Whether the stored hash was produced with outdated parameters
    fn needs_rehash(&self, _hash: &str) -> Result<bool, PasswordError> {
        Ok(false)
    }
}

/// Configuration for Argon2 password hashing
#[derive(Debug, Clone)]
pub struct PasswordConfig {
    /// Memory cost in KiB (default: 19456 = 19 MiB)
    pub memory_cost: u32,
    /// Time cost (iterations, default: 2)
    pub time_cost: u32,
    /// Parallelism factor (default: 1)
    pub parallelism: u32,
    /// Output hash length in bytes (default: 32)
    pub output_length: usize,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        // OWASP minimum parameters for Argon2id
        // https://cheatsheetseries.owasp.org/cheatsheets/Password_Storage_Cheat_Sheet.html
        Self {
            memory_cost: 19456,
            time_cost: 2,
            parallelism: 1,
            output_length: 32,
        }
    }
}

impl PasswordConfig {
    /// 25% of available memory, or 512 MiB when /proc/meminfo is unavailable
    fn get_safe_memory_limit() -> u32 {
        const FALLBACK_KIB: u32 = 524_288;

        let Ok(content) = std::fs::read_to_string("/proc/meminfo") else {
            return FALLBACK_KIB;
        };

        content
            .lines()
            .find(|line| line.starts_with("MemAvailable:"))
            .and_then(|line| line.split_whitespace().nth(1))
            .and_then(|kb| kb.parse::<u32>().ok())
            .map(|available_kb| available_kb / 4)
            .unwrap_or(FALLBACK_KIB)
    }

    fn validate_memory_cost(&self) -> Result<(), PasswordError> {
        let safe_limit = Self::get_safe_memory_limit();

        if self.memory_cost > safe_limit {
            return Err(PasswordError::MemoryCostTooHigh(
                self.memory_cost,
                safe_limit,
            ));
        }

        Ok(())
    }

    fn build_hasher(&self) -> Result<Argon2<'static>, PasswordError> {
        self.validate_memory_cost()?;

        let params = Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            Some(self.output_length),
        )
        .map_err(|e| PasswordError::HashingError(e.to_string()))?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// Argon2id implementation of [`PasswordHasher`]
#[derive(Debug, Clone, Default)]
pub struct Argon2Hasher {
    config: PasswordConfig,
}

impl Argon2Hasher {
    pub fn new(config: PasswordConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PasswordConfig {
        &self.config
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, PasswordError> {
        hash_password_with_config(password, &self.config)
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        verify_password(password, hash)
    }

    fn needs_rehash(&self, hash: &str) -> Result<bool, PasswordError> {
        needs_rehash(hash, &self.config)
    }
}

/// Hash a password using Argon2id with custom configuration
///
/// Returns the hash in PHC string format, e.g. `$argon2id$v=19$m=19456,t=2,p=1$...`
pub fn hash_password_with_config(
    password: &str,
    config: &PasswordConfig,
) -> Result<String, PasswordError> {
    let argon2 = config.build_hasher()?;
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashingError(e.to_string()))?;

    Ok(password_hash.to_string())
}

/// Verify a password against a hashed password.
/// Parameters are read from the PHC string, so hashes from older configs still verify.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHashFormat)?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerificationError(e.to_string())),
    }
}

/// Check if a hash needs to be upgraded (rehashed with newer parameters)
pub fn needs_rehash(hash: &str, config: &PasswordConfig) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHashFormat)?;

    if parsed_hash.algorithm != Algorithm::Argon2id.ident() {
        return Ok(true);
    }

    for (ident, value) in parsed_hash.params.iter() {
        let expected = match ident.as_str() {
            "m" => config.memory_cost,
            "t" => config.time_cost,
            "p" => config.parallelism,
            _ => continue,
        };
        if let Ok(actual) = value.decimal() {
            if actual != expected {
                return Ok(true);
            }
        }
    }

    Ok(false)
}
