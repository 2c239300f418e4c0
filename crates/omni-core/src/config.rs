//! Storefront configuration.
//!
//! Loaded from a TOML (or `.json`) file, then overridden by environment
//! variables:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `OMNISTORE_STORE_BACKEND` | `store.backend` (`memory` or `file`) |
//! | `OMNISTORE_STORE_PATH` | `store.path` |
//! | `OMNISTORE_OTP_MODE` | `otp.mode` (`local` or `provider`) |
//! | `OMNISTORE_OTP_TTL_SECS` | `otp.ttl_secs` |
//! | `OMNISTORE_OTP_MAX_ATTEMPTS` | `otp.max_attempts` |
//! | `OMNISTORE_REQUIRE_PHONE_VERIFICATION` | `session.require_phone_verification` |
//! | `OMNISTORE_REVERIFY_ON_LOGOUT` | `session.reverify_on_logout` |
//! | `OMNISTORE_UPI_ID` | `payment.upi_id` |
//! | `OMNISTORE_PAYEE_NAME` | `payment.payee_name` |
//! | `OMNISTORE_SEED_CATALOG` | `catalog.seed` |
//! | `OMNISTORE_ADMIN_EMAIL` | `admin.email` |
//! | `OMNISTORE_ADMIN_PASSWORD` | `admin.password` |
//! | `OMNISTORE_LOG_LEVEL` | `logging.level` |
//! | `OMNISTORE_LOG_FORMAT` | `logging.format` (`human` or `json`) |

use std::path::{Path, PathBuf};
use std::str::FromStr;

use omni_auth::{OtpConfig, OtpMode, SessionConfig};
use omni_commerce::Payee;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logging::LogFormat;

/// Prefix shared by every override variable.
pub const ENV_PREFIX: &str = "OMNISTORE_";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Top-level storefront configuration. Every field has a default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub store: StorageConfig,
    #[serde(default)]
    pub otp: OtpConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub payment: PaymentConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StoreConfig {
    /// Load config from a file. `.json` files are parsed as JSON, anything
    /// else as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let parsed = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        } else {
            toml::from_str(&content).map_err(|e| e.to_string())
        };

        parsed.map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Load `path` if given, otherwise defaults, then apply the process
    /// environment.
    pub fn load_with_env(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Apply `OMNISTORE_*` variables from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from `lookup`, which maps a full variable name to its
    /// value.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |suffix: &str| {
            let name = format!("{ENV_PREFIX}{suffix}");
            lookup(&name).map(|value| (name, value))
        };

        if let Some((name, value)) = get("STORE_BACKEND") {
            self.store.backend = parse_var(&name, &value)?;
        }
        if let Some((_, value)) = get("STORE_PATH") {
            self.store.path = PathBuf::from(value);
        }
        if let Some((name, value)) = get("OTP_MODE") {
            self.otp.mode = OtpMode::from_str(&value)
                .map_err(|_| ConfigError::InvalidEnvVar(name, value.clone()))?;
        }
        if let Some((name, value)) = get("OTP_TTL_SECS") {
            self.otp.ttl_secs = parse_var(&name, &value)?;
        }
        if let Some((name, value)) = get("OTP_MAX_ATTEMPTS") {
            self.otp.max_attempts = parse_var(&name, &value)?;
        }
        if let Some((name, value)) = get("REQUIRE_PHONE_VERIFICATION") {
            self.session.require_phone_verification = parse_var(&name, &value)?;
        }
        if let Some((name, value)) = get("REVERIFY_ON_LOGOUT") {
            self.session.reverify_on_logout = parse_var(&name, &value)?;
        }
        if let Some((_, value)) = get("UPI_ID") {
            self.payment.upi_id = value;
        }
        if let Some((_, value)) = get("PAYEE_NAME") {
            self.payment.payee_name = value;
        }
        if let Some((name, value)) = get("SEED_CATALOG") {
            self.catalog.seed = parse_var(&name, &value)?;
        }
        if let Some((_, value)) = get("ADMIN_EMAIL") {
            self.admin.email = value;
        }
        if let Some((_, value)) = get("ADMIN_PASSWORD") {
            self.admin.password = value;
        }
        if let Some((_, value)) = get("LOG_LEVEL") {
            self.logging.level = value;
        }
        if let Some((name, value)) = get("LOG_FORMAT") {
            self.logging.format = parse_var(&name, &value)?;
        }

        Ok(())
    }

    /// Serialize as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: PathBuf::from("<memory>"),
            message: e.to_string(),
        })
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnvVar(name.to_string(), value.to_string()))
}

/// Where storefront state lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Process memory; lost on exit.
    #[default]
    Memory,
    /// A single JSON file at `store.path`.
    File,
}

impl FromStr for Backend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "memory" => Ok(Backend::Memory),
            "file" => Ok(Backend::File),
            _ => Err(()),
        }
    }
}

/// Storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("omnistore.json")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            path: default_store_path(),
        }
    }
}

/// UPI payee for payment links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfig {
    #[serde(default = "default_upi_id")]
    pub upi_id: String,
    #[serde(default = "default_payee_name")]
    pub payee_name: String,
}

fn default_upi_id() -> String {
    "9392965097@ybl".to_string()
}

fn default_payee_name() -> String {
    "OmniStore".to_string()
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            upi_id: default_upi_id(),
            payee_name: default_payee_name(),
        }
    }
}

impl PaymentConfig {
    pub fn payee(&self) -> Payee {
        Payee::new(&self.upi_id, &self.payee_name)
    }
}

/// Catalog settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Write the starter products into an empty store.
    #[serde(default = "default_true")]
    pub seed: bool,
}

fn default_true() -> bool {
    true
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self { seed: true }
    }
}

/// The administrator account created at startup.
#[derive(Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_true")]
    pub seed: bool,
    #[serde(default = "default_admin_name")]
    pub name: String,
    #[serde(default = "default_admin_email")]
    pub email: String,
    #[serde(default = "default_admin_password")]
    pub password: String,
}

fn default_admin_name() -> String {
    "Admin".to_string()
}

fn default_admin_email() -> String {
    "admin@omnistore.com".to_string()
}

fn default_admin_password() -> String {
    "admin123".to_string()
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            seed: true,
            name: default_admin_name(),
            email: default_admin_email(),
            password: default_admin_password(),
        }
    }
}

// Keeps the password out of logs.
impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("seed", &self.seed)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.store.backend, Backend::Memory);
        assert_eq!(config.otp.ttl_secs, 600);
        assert_eq!(config.otp.mode, OtpMode::Local);
        assert!(config.session.require_phone_verification);
        assert!(!config.session.reverify_on_logout);
        assert_eq!(config.payment.upi_id, "9392965097@ybl");
        assert!(config.catalog.seed);
        assert_eq!(config.admin.email, "admin@omnistore.com");
        assert_eq!(config.logging.format, LogFormat::Human);
    }

    #[test]
    fn test_load_partial_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("omnistore.toml");
        std::fs::write(
            &path,
            r#"
[store]
backend = "file"
path = "/tmp/shop.json"

[otp]
mode = "provider"

[session]
reverify_on_logout = true
"#,
        )
        .unwrap();

        let config = StoreConfig::load(&path).unwrap();
        assert_eq!(config.store.backend, Backend::File);
        assert_eq!(config.store.path, PathBuf::from("/tmp/shop.json"));
        assert_eq!(config.otp.mode, OtpMode::Provider);
        assert_eq!(config.otp.max_attempts, 5);
        assert!(config.session.reverify_on_logout);
        assert!(config.session.require_phone_verification);
        assert_eq!(config.payment.payee_name, "OmniStore");
    }

    #[test]
    fn test_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("omnistore.json");
        std::fs::write(&path, r#"{"catalog": {"seed": false}}"#).unwrap();

        let config = StoreConfig::load(&path).unwrap();
        assert!(!config.catalog.seed);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            StoreConfig::load(dir.path().join("missing.toml")),
            Err(ConfigError::Read { .. })
        ));

        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[store\nbackend=").unwrap();
        assert!(matches!(
            StoreConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = StoreConfig::default();
        config
            .apply_overrides(lookup(&[
                ("OMNISTORE_STORE_BACKEND", "file"),
                ("OMNISTORE_STORE_PATH", "data/store.json"),
                ("OMNISTORE_OTP_MODE", "provider"),
                ("OMNISTORE_OTP_TTL_SECS", "120"),
                ("OMNISTORE_REVERIFY_ON_LOGOUT", "true"),
                ("OMNISTORE_UPI_ID", "shop@upi"),
                ("OMNISTORE_LOG_FORMAT", "json"),
            ]))
            .unwrap();

        assert_eq!(config.store.backend, Backend::File);
        assert_eq!(config.store.path, PathBuf::from("data/store.json"));
        assert_eq!(config.otp.mode, OtpMode::Provider);
        assert_eq!(config.otp.ttl_secs, 120);
        assert!(config.session.reverify_on_logout);
        assert_eq!(config.payment.payee().upi_id, "shop@upi");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_env_value() {
        let mut config = StoreConfig::default();
        let err = config
            .apply_overrides(lookup(&[("OMNISTORE_OTP_TTL_SECS", "ten")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(name, _) if name == "OMNISTORE_OTP_TTL_SECS"));

        assert!(config
            .apply_overrides(lookup(&[("OMNISTORE_STORE_BACKEND", "redis")]))
            .is_err());
    }

    #[test]
    fn test_toml_roundtrip_keeps_sections() {
        let text = StoreConfig::default().to_toml().unwrap();
        assert!(text.contains("[otp]"));
        assert!(text.contains("[payment]"));

        let parsed: StoreConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.payment.upi_id, "9392965097@ybl");
    }

    #[test]
    fn test_admin_debug_redacts_password() {
        let debug = format!("{:?}", AdminConfig::default());
        assert!(!debug.contains("admin123"));
    }
}
