use std::sync::Arc;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::{error, warn};

use crate::config::PasswordConfig;

/// Argon2id hashing with configurable cost. Cheap to clone.
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
    // Verified against when the email is unknown, so both login failures cost the same.
    dummy_digest: Arc<str>,
}

impl PasswordHasher {
    pub fn new(cfg: &PasswordConfig) -> anyhow::Result<Self> {
        let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
            .map_err(|e| anyhow::anyhow!("invalid argon2 parameters: {e}"))?;
        let mut hasher = Self {
            params,
            dummy_digest: Arc::from(""),
        };
        hasher.dummy_digest = Arc::from(hasher.hash("documind-dummy-password")?);
        Ok(hasher)
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn hash(&self, plain: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                anyhow::anyhow!(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }

    /// Cost parameters and salt come from `hash` itself. A digest that does not parse
    /// simply fails verification.
    pub fn verify(&self, plain: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "stored password hash is malformed");
                return false;
            }
        };
        self.argon2()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok()
    }

    /// Burns the same work as [`verify`](Self::verify) without any stored digest.
    pub fn verify_dummy(&self, plain: &str) {
        let _ = self.verify(plain, &self.dummy_digest);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(&PasswordConfig {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        })
        .expect("cheap params are valid")
    }

    #[test]
    fn hash_and_verify_roundtrip() {
        let hasher = hasher();
        let password = "Secur3P@ssw0rd!";
        let hash = hasher.hash(password).expect("hashing should succeed");
        assert!(hasher.verify(password, &hash));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let hasher = hasher();
        let hash = hasher.hash("correct-horse-battery-staple").unwrap();
        assert!(!hasher.verify("wrong-password", &hash));
    }

    #[test]
    fn same_password_gets_a_fresh_salt_each_time() {
        let hasher = hasher();
        let a = hasher.hash("Secret123").unwrap();
        let b = hasher.hash("Secret123").unwrap();
        assert_ne!(a, b);
        assert!(hasher.verify("Secret123", &a));
        assert!(hasher.verify("Secret123", &b));
    }

    #[test]
    fn digest_does_not_contain_plaintext() {
        let hash = hasher().hash("Secret123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("Secret123"));
    }

    #[test]
    fn malformed_hash_fails_verification_instead_of_erroring() {
        let hasher = hasher();
        assert!(!hasher.verify("anything", "not-a-valid-hash"));
        assert!(!hasher.verify("anything", ""));
    }

    #[test]
    fn verification_uses_the_params_stored_in_the_digest() {
        let strong = PasswordHasher::new(&PasswordConfig {
            memory_kib: 16,
            iterations: 2,
            parallelism: 1,
        })
        .unwrap();
        let hash = strong.hash("Secret123").unwrap();
        assert!(hasher().verify("Secret123", &hash));
    }

    #[test]
    fn dummy_digest_is_a_real_argon2_digest() {
        let hasher = hasher();
        assert!(hasher.dummy_digest.starts_with("$argon2id$"));
        assert!(hasher.verify("documind-dummy-password", &hasher.dummy_digest));
    }

    #[test]
    fn rejects_impossible_params() {
        assert!(PasswordHasher::new(&PasswordConfig {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        })
        .is_err());
    }
}
