//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

/// HTTP header carrying the function key.
pub const FUNCTIONS_KEY_HEADER: &str = "x-functions-key";

/// Query parameter consulted when the key header is absent.
pub const CODE_QUERY_PARAM: &str = "code";

/// Reserved key name reported for a master-key match.
pub const MASTER_KEY_NAME: &str = "master";

/// Development default values - NEVER use in production.
pub mod defaults {
    pub const DEV_HOST: &str = "127.0.0.1";
    pub const DEV_PORT: u16 = 7071;
    pub const DEV_SECRETS_DIR: &str = "./secrets";
}

/// Runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Parse environment from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    /// Check if this is a development environment.
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    /// Check if this is a production environment.
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Runtime environment
    pub environment: Environment,
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Directory holding `host.json` and per-function key files
    pub secrets_dir: PathBuf,
    /// Global switch disabling key authorization entirely
    pub auth_disabled: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In development mode (RUST_ENV=development):
    /// - All variables have sensible defaults
    /// - Only RUST_ENV is required
    ///
    /// In production mode (RUST_ENV=production):
    /// - FUNCGATE_SECRETS_DIR is required
    /// - FUNCGATE_AUTH_DISABLED must not be set
    ///
    /// Environment variables:
    /// - `RUST_ENV`: Environment (development/production) - REQUIRED
    /// - `FUNCGATE_HOST`: Server host (default: 127.0.0.1)
    /// - `FUNCGATE_PORT`: Server port (default: 7071)
    /// - `FUNCGATE_SECRETS_DIR`: Secrets directory (default: ./secrets)
    /// - `FUNCGATE_AUTH_DISABLED`: Disable key authorization (true/1, dev only)
    pub fn from_env() -> Result<Self, ConfigError> {
        // Parse environment - required
        let env_str = env::var("RUST_ENV").map_err(|_| ConfigError::MissingEnvVar("RUST_ENV"))?;

        let environment = Environment::parse(&env_str).ok_or(ConfigError::InvalidValue(
            "RUST_ENV must be 'development' or 'production'",
        ))?;

        // Load values with defaults
        let host = env::var("FUNCGATE_HOST").unwrap_or_else(|_| defaults::DEV_HOST.to_string());

        let port = env::var("FUNCGATE_PORT")
            .unwrap_or_else(|_| defaults::DEV_PORT.to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidValue("FUNCGATE_PORT must be a valid port number"))?;

        let secrets_dir = match env::var("FUNCGATE_SECRETS_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) if environment.is_development() => PathBuf::from(defaults::DEV_SECRETS_DIR),
            Err(_) => return Err(ConfigError::MissingEnvVar("FUNCGATE_SECRETS_DIR")),
        };

        let auth_disabled = match env::var("FUNCGATE_AUTH_DISABLED") {
            Ok(v) => match v.to_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" | "" => false,
                _ => {
                    return Err(ConfigError::InvalidValue(
                        "FUNCGATE_AUTH_DISABLED must be a boolean",
                    ));
                }
            },
            Err(_) => false,
        };

        let config = Config {
            environment,
            host,
            port,
            secrets_dir,
            auth_disabled,
        };

        // Validate production configuration
        if environment.is_production() {
            config.validate_production()?;
        }

        Ok(config)
    }

    /// Validate that production configuration does not use development settings.
    fn validate_production(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.secrets_dir == PathBuf::from(defaults::DEV_SECRETS_DIR) {
            errors.push(format!(
                "FUNCGATE_SECRETS_DIR is using development default '{}'. Point it at a provisioned secrets directory.",
                defaults::DEV_SECRETS_DIR
            ));
        }

        if self.auth_disabled {
            errors.push(
                "FUNCGATE_AUTH_DISABLED is set. Key authorization cannot be disabled in production."
                    .to_string(),
            );
        }

        if !errors.is_empty() {
            return Err(ConfigError::ProductionValidation(errors));
        }

        Ok(())
    }

    /// Get the server bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if running in development mode.
    pub fn is_development(&self) -> bool {
        self.environment.is_development()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(&'static str),

    #[error("Production configuration validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    ProductionValidation(Vec<String>),
}
