//! In-memory secret store for tests and development bootstrap.

use std::collections::BTreeMap;

use async_trait::async_trait;
use secrecy::SecretString;

use super::{HostSecrets, SecretMap, SecretStore, SecretStoreError};

/// Fixed, in-memory secret collections.
///
/// Built once with the builder methods; never mutated afterwards, so it is
/// trivially safe for concurrent reads.
#[derive(Default)]
pub struct StaticSecretStore {
    host: HostSecrets,
    function_keys: BTreeMap<String, SecretMap>,
}

impl StaticSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the master key.
    pub fn with_master(mut self, value: &str) -> Self {
        self.host.master_key = Some(SecretString::from(value.to_string()));
        self
    }

    /// Add a system key.
    pub fn with_system_key(mut self, name: &str, value: &str) -> Self {
        self.host
            .system_keys
            .insert(name.to_string(), SecretString::from(value.to_string()));
        self
    }

    /// Add a key scoped to one function.
    pub fn with_function_key(mut self, function_name: &str, name: &str, value: &str) -> Self {
        self.function_keys
            .entry(function_name.to_lowercase())
            .or_default()
            .insert(name.to_string(), SecretString::from(value.to_string()));
        self
    }
}

#[async_trait]
impl SecretStore for StaticSecretStore {
    async fn get_host_secrets(&self) -> Result<HostSecrets, SecretStoreError> {
        Ok(self.host.clone())
    }

    async fn get_function_secrets(
        &self,
        function_name: &str,
    ) -> Result<SecretMap, SecretStoreError> {
        Ok(self
            .function_keys
            .get(&function_name.to_lowercase())
            .cloned()
            .unwrap_or_default())
    }
}
