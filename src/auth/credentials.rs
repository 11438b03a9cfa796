//! The single static admin credential
//!
//! One username, one secret. The secret is either an Argon2id PHC string
//! (`JEZA_PASSWORD_HASH`, produced by `--hash-password`) or the plaintext
//! password (`JEZA_PASSWORD`). The hash wins when both are set.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use tracing::warn;

use crate::config::Args;
use crate::types::AdminError;

/// PHC string suitable for `JEZA_PASSWORD_HASH`
pub fn hash_password(password: &str) -> Result<String, AdminError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AdminError::Internal(format!("Argon2 hashing failed: {e}")))
}

/// Check a password against the configured hash; a malformed hash is a
/// configuration error, not a mismatch
fn matches_hash(password: &str, hash: &str) -> Result<bool, AdminError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AdminError::Config(format!("JEZA_PASSWORD_HASH is not a PHC string: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[derive(Clone)]
enum Secret {
    Hashed(String),
    Plain(String),
    /// No password configured: every login fails
    Missing,
}

/// Configured admin account
#[derive(Clone)]
pub struct AdminCredential {
    username: String,
    secret: Secret,
}

impl std::fmt::Debug for AdminCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.secret {
            Secret::Hashed(_) => "hashed",
            Secret::Plain(_) => "plain",
            Secret::Missing => "missing",
        };
        f.debug_struct("AdminCredential")
            .field("username", &self.username)
            .field("secret", &kind)
            .finish()
    }
}

impl AdminCredential {
    pub fn from_args(args: &Args) -> Self {
        let secret = match (&args.admin_password_hash, &args.admin_password) {
            (Some(hash), _) if !hash.is_empty() => Secret::Hashed(hash.clone()),
            (_, Some(plain)) if !plain.is_empty() => Secret::Plain(plain.clone()),
            _ => Secret::Missing,
        };

        Self {
            username: args.admin_username.clone(),
            secret,
        }
    }

    pub fn plain(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: Secret::Plain(password.into()),
        }
    }

    pub fn hashed(username: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: Secret::Hashed(hash.into()),
        }
    }

    /// Whether a password (plain or hashed) is configured
    pub fn is_configured(&self) -> bool {
        !matches!(self.secret, Secret::Missing)
    }

    /// Check a username/password pair. Any mismatch returns false.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        if username != self.username || password.is_empty() {
            return false;
        }

        match &self.secret {
            Secret::Plain(expected) => constant_time_eq(expected.as_bytes(), password.as_bytes()),
            Secret::Hashed(hash) => match matches_hash(password, hash) {
                Ok(valid) => valid,
                Err(e) => {
                    warn!(error = %e, "Configured admin password hash is unusable");
                    false
                }
            },
            Secret::Missing => false,
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
