//! Key-based authorization engine.
//!
//! Resolves a caller's authorization level by matching the presented key
//! against the tiered secret collections, and gates protected operations on
//! the resolved level.

mod gate;
mod matcher;
mod resolver;

use secrecy::{ExposeSecret, SecretString};

pub use gate::{AuthGate, Authorized, GateSettings, SecretStoreHandle};
pub use matcher::{MatchEvaluator, find_key_match, named_key_evaluator, secret_value_equals};
pub use resolver::{presented_key, resolve};

use crate::config::MASTER_KEY_NAME;

/// Authorization level, in ascending trust order.
///
/// The declaration order is the total order the gate compares against:
/// a resolved level authorizes every requirement at or below it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AuthorizationLevel {
    Anonymous,
    User,
    Function,
    System,
    Admin,
}

impl AuthorizationLevel {
    /// Parse a level from its lowercase name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "anonymous" => Some(Self::Anonymous),
            "user" => Some(Self::User),
            "function" => Some(Self::Function),
            "system" => Some(Self::System),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::User => "user",
            Self::Function => "function",
            Self::System => "system",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for AuthorizationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one authorization resolution.
///
/// Immutable once produced; cached on the request for its remaining
/// lifetime so resolution happens at most once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationResult {
    pub level: AuthorizationLevel,
    /// Name of the matched key: `None` for Anonymous, the reserved master
    /// name for a master-key match, the secret's own name otherwise.
    pub key_name: Option<String>,
}

impl AuthorizationResult {
    pub fn new(level: AuthorizationLevel, key_name: impl Into<String>) -> Self {
        Self {
            level,
            key_name: Some(key_name.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self {
            level: AuthorizationLevel::Anonymous,
            key_name: None,
        }
    }

    pub fn admin() -> Self {
        Self::new(AuthorizationLevel::Admin, MASTER_KEY_NAME)
    }
}

/// Wrapper type for the host master key.
/// Uses `SecretString` to prevent accidental logging and zeroize on drop.
///
/// # Security features
/// - `Debug` prints `[REDACTED]` instead of the actual value
/// - Memory is zeroed when dropped (via `zeroize`)
/// - Explicit `.expose_secret()` required to access the value
#[derive(Clone, Default)]
pub struct MasterKey(Option<SecretString>);

impl MasterKey {
    /// Create a new MasterKey from an optional secret.
    pub fn new(key: Option<SecretString>) -> Self {
        Self(key)
    }

    /// Securely compare the provided key with the stored master key.
    ///
    /// Constant-time comparison; a host without a master key matches
    /// nothing.
    pub fn verify(&self, provided: &str) -> bool {
        match &self.0 {
            Some(secret) => {
                !secret.expose_secret().is_empty()
                    && secret_value_equals(secret.expose_secret(), provided)
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Some(_) => write!(f, "MasterKey([REDACTED])"),
            None => write!(f, "MasterKey(None)"),
        }
    }
}
