//! JSON-file-backed secret store.
//!
//! Layout under the secrets directory:
//! - `host.json` holds the master key and the system keys
//! - `<function>.json` holds the keys scoped to that function
//!
//! Files are read on every fetch; any caching belongs to an outer layer.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use secrecy::SecretString;
use serde::Deserialize;

use super::{HostSecrets, SecretMap, SecretStore, SecretStoreError};

/// Shape of `host.json`.
#[derive(Deserialize)]
struct HostSecretsFile {
    #[serde(rename = "masterKey")]
    master_key: Option<SecretString>,
    #[serde(rename = "systemKeys", default)]
    system_keys: std::collections::BTreeMap<String, SecretString>,
}

/// Shape of `<function>.json`.
#[derive(Deserialize)]
struct FunctionSecretsFile {
    #[serde(default)]
    keys: std::collections::BTreeMap<String, SecretString>,
}

/// Secret store reading JSON files from a directory.
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    secrets_dir: PathBuf,
}

impl FileSecretStore {
    /// Create a store over the given secrets directory.
    pub fn new(secrets_dir: impl Into<PathBuf>) -> Self {
        Self {
            secrets_dir: secrets_dir.into(),
        }
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        path: &Path,
    ) -> Result<Option<T>, SecretStoreError> {
        let raw = match tokio::fs::read(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SecretStoreError::Io(e)),
        };

        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|e| SecretStoreError::Malformed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
    }

    fn function_file(&self, function_name: &str) -> PathBuf {
        self.secrets_dir
            .join(format!("{}.json", function_name.to_lowercase()))
    }
}

#[async_trait]
impl SecretStore for FileSecretStore {
    async fn get_host_secrets(&self) -> Result<HostSecrets, SecretStoreError> {
        let path = self.secrets_dir.join("host.json");
        let file: HostSecretsFile = Self::read_json(&path).await?.ok_or_else(|| {
            SecretStoreError::Unavailable(format!("missing {}", path.display()))
        })?;

        Ok(HostSecrets {
            master_key: file.master_key,
            system_keys: file.system_keys,
        })
    }

    async fn get_function_secrets(
        &self,
        function_name: &str,
    ) -> Result<SecretMap, SecretStoreError> {
        let path = self.function_file(function_name);
        match Self::read_json::<FunctionSecretsFile>(&path).await? {
            Some(file) => Ok(file.keys),
            // A function with no key file simply has no function keys.
            None => Ok(SecretMap::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, contents: &str) {
        let mut f = std::fs::File::create(dir.join(name)).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
    }

    #[tokio::test]
    async fn test_reads_host_secrets() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "host.json",
            r#"{"masterKey": "M1", "systemKeys": {"sys1": "S1", "sys2": "S2"}}"#,
        );

        let store = FileSecretStore::new(dir.path());
        let host = store.get_host_secrets().await.unwrap();

        assert_eq!(host.master_key.unwrap().expose_secret(), "M1");
        assert_eq!(host.system_keys.len(), 2);
        assert_eq!(host.system_keys["sys1"].expose_secret(), "S1");
    }

    #[tokio::test]
    async fn test_host_file_without_master_key() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "host.json", r#"{"systemKeys": {}}"#);

        let store = FileSecretStore::new(dir.path());
        let host = store.get_host_secrets().await.unwrap();

        assert!(host.master_key.is_none());
        assert!(host.system_keys.is_empty());
    }

    #[tokio::test]
    async fn test_missing_host_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSecretStore::new(dir.path());

        let err = store.get_host_secrets().await.unwrap_err();
        assert!(matches!(err, SecretStoreError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_malformed_host_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "host.json", "{not json");

        let store = FileSecretStore::new(dir.path());
        let err = store.get_host_secrets().await.unwrap_err();
        assert!(matches!(err, SecretStoreError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_reads_function_secrets_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "ping.json", r#"{"keys": {"fk1": "F1"}}"#);

        let store = FileSecretStore::new(dir.path());
        let keys = store.get_function_secrets("Ping").await.unwrap();

        assert_eq!(keys["fk1"].expose_secret(), "F1");
    }

    #[tokio::test]
    async fn test_missing_function_file_yields_empty_collection() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSecretStore::new(dir.path());

        let keys = store.get_function_secrets("nope").await.unwrap();
        assert!(keys.is_empty());
    }
}
