//! # Credentials
//!
//! The register never compares passwords itself; it asks a
//! [`CredentialVerifier`]. The default implementation hashes with Argon2id
//! and stores PHC strings (`$argon2id$v=19$...`).

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use tally_core::{CoreError, CoreResult};

/// Hashes new secrets and checks presented ones against stored hashes.
pub trait CredentialVerifier: Send + Sync {
    /// Hashes a secret for storage.
    fn hash(&self, secret: &str) -> CoreResult<String>;

    /// Checks `secret` against a stored hash. Malformed hashes never match.
    fn verify(&self, secret: &str, hash: &str) -> bool;
}

/// Argon2id credential hashing.
pub struct Argon2Credentials {
    argon2: Argon2<'static>,
}

impl Argon2Credentials {
    /// Argon2id with the crate's recommended parameters.
    pub fn new() -> Self {
        Argon2Credentials {
            argon2: Argon2::default(),
        }
    }

    /// Argon2id with the smallest legal cost. For tests and demos only.
    pub fn low_cost() -> CoreResult<Self> {
        let params = Params::new(Params::MIN_M_COST, Params::MIN_T_COST, Params::MIN_P_COST, None)
            .map_err(|e| CoreError::Credential(e.to_string()))?;
        Ok(Argon2Credentials {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

impl Default for Argon2Credentials {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Argon2Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Argon2Credentials").finish_non_exhaustive()
    }
}

impl CredentialVerifier for Argon2Credentials {
    fn hash(&self, secret: &str) -> CoreResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|e| CoreError::Credential(format!("Failed to hash secret: {}", e)))?;
        Ok(hash.to_string())
    }

    fn verify(&self, secret: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(h) => h,
            Err(_) => return false,
        };

        self.argon2
            .verify_password(secret.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let creds = Argon2Credentials::low_cost().unwrap();
        let hash = creds.hash("password123").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(creds.verify("password123", &hash));
        assert!(!creds.verify("password124", &hash));
    }

    #[test]
    fn test_salts_differ() {
        let creds = Argon2Credentials::low_cost().unwrap();
        let a = creds.hash("same").unwrap();
        let b = creds.hash("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash_never_matches() {
        let creds = Argon2Credentials::low_cost().unwrap();
        assert!(!creds.verify("password123", "not-a-phc-string"));
        assert!(!creds.verify("", ""));
    }
}
