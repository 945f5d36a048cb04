//! The shared rescue secret and its persistence.
//!
//! A single secret substitutes for normal session authentication while the
//! host application is broken. It is generated once, stored in the host's
//! key-value storage, and compared on every gated request. Rotating it
//! invalidates every previously issued rescue URL and debug-flag token.

use crate::error::{RescueError, RescueResult};
use crate::store::kv::KeyValueStore;
use rand::rngs::OsRng;
use rand::Rng;
use std::sync::Arc;
use zeroize::Zeroize;

/// Storage key under which the secret lives.
pub const SECRET_STORE_KEY: &str = "rescue_secret";

const GENERATED_LEN: usize = 32;
const ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*()-_=+";

/// The rescue secret. Zeroized on drop; never printed by `Debug`.
pub struct Secret(String);

impl Secret {
    pub fn reveal(&self) -> &str {
        &self.0
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

/// Accessor for the current secret.
pub struct SecretStore {
    kv: Arc<dyn KeyValueStore>,
}

impl SecretStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// The stored secret, without generating one. `None` means rescue mode
    /// cannot authenticate anything yet.
    pub fn stored(&self) -> RescueResult<Option<Secret>> {
        Ok(self.kv.get(SECRET_STORE_KEY)?.map(Secret))
    }

    /// The current secret, generating and persisting a fresh random one if
    /// none exists. Storage failure surfaces as `StorageUnavailable`, which
    /// callers treat as "rescue disabled" rather than a crash.
    pub fn current(&self) -> RescueResult<Secret> {
        if let Some(secret) = self.stored()? {
            return Ok(secret);
        }
        let generated = generate_secret();
        self.kv.put(SECRET_STORE_KEY, &generated)?;
        tracing::info!("Generated a new rescue secret");
        Ok(Secret(generated))
    }

    /// Persist an operator-chosen secret. Surrounding whitespace is trimmed
    /// and embedded spaces are stripped; an empty result is rejected.
    ///
    /// Authorization is the caller's responsibility.
    pub fn set(&self, candidate: &str) -> RescueResult<()> {
        let cleaned: String = candidate.trim().chars().filter(|c| *c != ' ').collect();
        if cleaned.is_empty() {
            return Err(RescueError::InvalidSecret);
        }
        self.kv.put(SECRET_STORE_KEY, &cleaned)
    }
}

/// Construct a secret directly, bypassing storage. Tests only.
#[cfg(test)]
pub(crate) fn test_secret(value: &str) -> Secret {
    Secret(value.to_string())
}

fn generate_secret() -> String {
    let mut rng = OsRng;
    (0..GENERATED_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}
