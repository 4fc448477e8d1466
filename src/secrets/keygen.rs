//! Key generation and log-safe key identity.

use rand::RngExt;
use sha2::{Digest, Sha256};

/// Length of generated key values.
const KEY_LENGTH: usize = 43;

/// Hex characters of the SHA-256 digest kept as the log identity of a key.
const FINGERPRINT_LENGTH: usize = 8;

/// Generate a new random key value.
///
/// The value is shown to the operator once and then lives only in the
/// secret store.
pub fn generate_key() -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(KEY_LENGTH)
        .map(char::from)
        .collect()
}

/// Short digest of a key value, safe to log.
///
/// Logs must never carry key bytes, including prefixes; a truncated SHA-256
/// identifies the key across log lines without revealing anything about it.
pub fn fingerprint(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
        .chars()
        .take(FINGERPRINT_LENGTH)
        .collect()
}
