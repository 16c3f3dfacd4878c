//! Configuration module for Tokengate
//!
//! Handles loading and parsing of YAML configuration files with support for
//! environment variable expansion and validation at startup. Broken signing
//! configuration is meant to be fatal here, never a per-request error.

use crate::token::{AlgorithmFamily, AllowedFamilies};
use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub auth: AuthConfig,
}

impl Config {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        ConfigLoader::load(path)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.auth.validate()
    }
}

/// Authentication configuration
///
/// `signing_method` and `signing_key` drive token issuance;
/// `allow_signing_method` is the comma-separated list of algorithm families
/// trusted during validation, which is a separate policy surface on purpose.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub signing_method: String,

    /// HMAC secret or private key PEM, depending on the method.
    /// Supports ${VAR} expansion. Never logged.
    pub signing_key: String,

    /// Public key PEM; required whenever the signing method is asymmetric.
    #[serde(default)]
    pub public_key: Option<String>,

    /// Comma-separated family names: HMAC, RSA, RSAPSS, ECDSA, Ed25519
    pub allow_signing_method: String,

    #[serde(default = "default_token_expiry_secs")]
    pub token_expiry_secs: u64,

    #[serde(default = "default_resolver_timeout_ms")]
    pub resolver_timeout_ms: u64,
}

impl AuthConfig {
    /// The algorithm used to issue new tokens.
    ///
    /// ES512 is absent: `jsonwebtoken` has no P-521 backend. ECDSA
    /// deployments are limited to ES256/ES384.
    pub fn method(&self) -> Result<Algorithm, ConfigError> {
        Ok(match self.signing_method.as_str() {
            "HS256" => Algorithm::HS256,
            "HS384" => Algorithm::HS384,
            "HS512" => Algorithm::HS512,
            "RS256" => Algorithm::RS256,
            "RS384" => Algorithm::RS384,
            "RS512" => Algorithm::RS512,
            "ES256" => Algorithm::ES256,
            "ES384" => Algorithm::ES384,
            "PS256" => Algorithm::PS256,
            "PS384" => Algorithm::PS384,
            "PS512" => Algorithm::PS512,
            "EdDSA" => Algorithm::EdDSA,
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Unknown signing method '{}'",
                    other
                )))
            }
        })
    }

    /// The algorithm families accepted during validation.
    pub fn families(&self) -> Result<AllowedFamilies, ConfigError> {
        let set: AllowedFamilies = self
            .allow_signing_method
            .parse()
            .map_err(|e: crate::token::UnknownFamily| {
                ConfigError::ValidationError(e.to_string())
            })?;

        if set.is_empty() {
            return Err(ConfigError::ValidationError(
                "allow_signing_method must name at least one family".into(),
            ));
        }

        Ok(set)
    }

    pub fn token_expiry(&self) -> Duration {
        Duration::from_secs(self.token_expiry_secs)
    }

    pub fn resolver_timeout(&self) -> Duration {
        Duration::from_millis(self.resolver_timeout_ms)
    }

    pub(crate) fn public_key_bytes(&self) -> Result<&[u8], ConfigError> {
        self.public_key
            .as_deref()
            .map(str::as_bytes)
            .ok_or_else(|| {
                ConfigError::ValidationError(
                    "public_key is required for asymmetric signing methods".into(),
                )
            })
    }

    /// Validate the authentication configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let method = self.method()?;
        self.families()?;

        if self.signing_key.is_empty() {
            return Err(ConfigError::ValidationError(
                "signing_key must not be empty".into(),
            ));
        }

        if self.token_expiry_secs == 0 {
            return Err(ConfigError::ValidationError(
                "token_expiry_secs must be positive".into(),
            ));
        }

        if AlgorithmFamily::of(method) != AlgorithmFamily::Hmac && self.public_key.is_none() {
            return Err(ConfigError::ValidationError(format!(
                "public_key is required for signing method {}",
                self.signing_method
            )));
        }

        Ok(())
    }
}

fn default_token_expiry_secs() -> u64 {
    3600
}

fn default_resolver_timeout_ms() -> u64 {
    5000
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hmac_config() -> AuthConfig {
        AuthConfig {
            signing_method: "HS256".into(),
            signing_key: "signing-key".into(),
            public_key: None,
            allow_signing_method: "HMAC".into(),
            token_expiry_secs: 3600,
            resolver_timeout_ms: 5000,
        }
    }

    #[test]
    fn test_valid_hmac_config() {
        assert!(hmac_config().validate().is_ok());
    }

    #[test]
    fn test_every_documented_method_parses() {
        for name in [
            "HS256", "HS384", "HS512", "RS256", "RS384", "RS512", "ES256", "ES384", "PS256",
            "PS384", "PS512", "EdDSA",
        ] {
            let mut config = hmac_config();
            config.signing_method = name.into();
            assert!(config.method().is_ok(), "{}", name);
        }
    }

    #[test]
    fn test_es512_rejected_as_unknown() {
        let mut config = hmac_config();
        config.signing_method = "ES512".into();
        match config.method() {
            Err(ConfigError::ValidationError(msg)) => assert!(msg.contains("ES512")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_method_rejected() {
        let mut config = hmac_config();
        config.signing_method = "HS1024".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_empty_signing_key_rejected() {
        let mut config = hmac_config();
        config.signing_key = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_expiry_rejected() {
        let mut config = hmac_config();
        config.token_expiry_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_asymmetric_method_requires_public_key() {
        let mut config = hmac_config();
        config.signing_method = "RS256".into();
        config.allow_signing_method = "RSA".into();
        assert!(config.validate().is_err());

        config.public_key = Some("-----BEGIN PUBLIC KEY-----".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_family_list_rejected() {
        let mut config = hmac_config();
        config.allow_signing_method = "HMAC,KEY".into();
        assert!(config.validate().is_err());

        config.allow_signing_method = " , ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_durations() {
        let config = hmac_config();
        assert_eq!(config.token_expiry(), Duration::from_secs(3600));
        assert_eq!(config.resolver_timeout(), Duration::from_millis(5000));
    }
}
