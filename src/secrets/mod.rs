//! Secret store contract and implementations.
//!
//! The authorization engine only ever reads secrets: a single host master
//! key, named system keys shared across functions, and named keys scoped to
//! one function. Retrieval may be slow (disk, network), so the contract is
//! async; rotation, persistence, and encryption-at-rest live behind it.

mod file;
mod keygen;
mod memory;

use std::collections::BTreeMap;

use async_trait::async_trait;
use secrecy::SecretString;

pub use file::FileSecretStore;
pub use keygen::{fingerprint, generate_key};
pub use memory::StaticSecretStore;

/// Named secrets, ordered by name.
///
/// The name order is also the documented tie-break order when two entries
/// carry the same value: the first match in iteration order wins.
pub type SecretMap = BTreeMap<String, SecretString>;

/// Host-level secrets: the master key plus the shared system keys.
#[derive(Clone, Default)]
pub struct HostSecrets {
    /// Master key granting Admin level. Absent on hosts without one.
    pub master_key: Option<SecretString>,
    /// System keys granting System level, shared across all functions.
    pub system_keys: SecretMap,
}

impl std::fmt::Debug for HostSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostSecrets")
            .field("master_key", &self.master_key.as_ref().map(|_| "[REDACTED]"))
            .field("system_keys", &self.system_keys.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Secret store failures.
///
/// Every variant is terminal for the resolution attempt that hit it; the
/// gate treats all of them as a deny.
#[derive(Debug, thiserror::Error)]
pub enum SecretStoreError {
    #[error("Failed to read secrets: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed secrets file {path}: {reason}")]
    Malformed { path: String, reason: String },

    #[error("Secret store unavailable: {0}")]
    Unavailable(String),
}

/// Read-only provider of the tiered secret collections.
///
/// Implementations must be safe for concurrent reads from many requests in
/// flight; the engine issues no writes.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the master key and system keys.
    async fn get_host_secrets(&self) -> Result<HostSecrets, SecretStoreError>;

    /// Fetch the keys scoped to one function. Unknown functions yield an
    /// empty collection, not an error.
    async fn get_function_secrets(
        &self,
        function_name: &str,
    ) -> Result<SecretMap, SecretStoreError>;
}
