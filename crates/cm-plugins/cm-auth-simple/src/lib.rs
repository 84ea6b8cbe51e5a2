//! # cm-auth-simple
//!
//! Argon2-based implementation of `AdminGate`.
//! The configured value is a PHC-format hash; the plain passphrase is never stored.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use cm_core::traits::AdminGate;
use secrecy::{ExposeSecret, SecretString};

pub struct PassphraseGate {
    /// `None` locks the admin surface entirely.
    hash: Option<SecretString>,
}

impl PassphraseGate {
    pub fn new(hash: Option<SecretString>) -> Self {
        if hash.is_none() {
            tracing::warn!("no admin passphrase hash configured; admin commands are locked");
        }
        Self { hash }
    }
}

#[async_trait]
impl AdminGate for PassphraseGate {
    /// Verifies if a provided passphrase matches the stored Argon2 hash.
    async fn verify(&self, passphrase: &str) -> bool {
        let Some(hash) = &self.hash else {
            return false;
        };
        let parsed_hash = match PasswordHash::new(hash.expose_secret()) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "configured admin hash is not a valid PHC string");
                return false;
            }
        };
        Argon2::default()
            .verify_password(passphrase.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

/// Produces the PHC string to put in `admin.passphrase_hash`.
pub fn hash_passphrase(passphrase: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(passphrase.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("hashing passphrase: {e}"))?;
    Ok(hash.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn accepts_only_the_hashed_passphrase() {
        let hash = hash_passphrase("shelf-keeper").unwrap();
        let gate = PassphraseGate::new(Some(SecretString::from(hash)));
        assert!(gate.verify("shelf-keeper").await);
        assert!(!gate.verify("shelf-keeper ").await);
        assert!(!gate.verify("").await);
    }

    #[tokio::test]
    async fn missing_or_malformed_hash_rejects_everything() {
        assert!(!PassphraseGate::new(None).verify("anything").await);
        let broken = PassphraseGate::new(Some(SecretString::from("not-a-phc-string".to_string())));
        assert!(!broken.verify("not-a-phc-string").await);
    }
}
