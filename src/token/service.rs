//! Token service
//!
//! Holds the issue-side signing method and key plus the validation-side
//! allow-list. Immutable after construction and safe to share across
//! concurrent request tasks.

use super::{AlgorithmFamily, AllowedFamilies, ClaimsProvider, TokenError};
use crate::config::{AuthConfig, ConfigError};
use chrono::Utc;
use jsonwebtoken::{
    decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;

/// Token service
///
/// The signing method/key pair is fixed at construction and used only for
/// issuing. Validation accepts any algorithm whose family is on the
/// allow-list and that verifies under the configured key.
///
/// # Example
///
/// ```
/// use jsonwebtoken::Algorithm;
/// use tokengate::token::{AlgorithmFamily, AllowedFamilies, TokenService};
///
/// let service = TokenService::hmac(
///     Algorithm::HS256,
///     b"signing-key",
///     AllowedFamilies::only(AlgorithmFamily::Hmac),
/// )
/// .unwrap();
/// ```
pub struct TokenService {
    method: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    allow: AllowedFamilies,
}

impl TokenService {
    /// Create an HMAC service (HS256/HS384/HS512).
    ///
    /// The shared secret signs and verifies.
    pub fn hmac(
        method: Algorithm,
        secret: &[u8],
        allow: AllowedFamilies,
    ) -> Result<Self, TokenError> {
        Self::expect_family(method, AlgorithmFamily::Hmac)?;
        Ok(Self {
            method,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            allow,
        })
    }

    /// Create an RSA service (RS256/RS384/RS512, PS256/PS384/PS512).
    ///
    /// RSA-PSS methods share RSA key material, so both families go through
    /// this constructor. Signing uses the private key PEM, verification the
    /// public key PEM.
    pub fn rsa(
        method: Algorithm,
        private_pem: &[u8],
        public_pem: &[u8],
        allow: AllowedFamilies,
    ) -> Result<Self, TokenError> {
        let family = AlgorithmFamily::of(method);
        if family != AlgorithmFamily::Rsa && family != AlgorithmFamily::RsaPss {
            return Err(TokenError::InvalidKey(format!(
                "{:?} is not an RSA or RSA-PSS method",
                method
            )));
        }
        Ok(Self {
            method,
            encoding_key: EncodingKey::from_rsa_pem(private_pem)
                .map_err(|e| TokenError::InvalidKey(e.to_string()))?,
            decoding_key: DecodingKey::from_rsa_pem(public_pem)
                .map_err(|e| TokenError::InvalidKey(e.to_string()))?,
            allow,
        })
    }

    /// Create an ECDSA service (ES256/ES384).
    pub fn ecdsa(
        method: Algorithm,
        private_pem: &[u8],
        public_pem: &[u8],
        allow: AllowedFamilies,
    ) -> Result<Self, TokenError> {
        Self::expect_family(method, AlgorithmFamily::Ecdsa)?;
        Ok(Self {
            method,
            encoding_key: EncodingKey::from_ec_pem(private_pem)
                .map_err(|e| TokenError::InvalidKey(e.to_string()))?,
            decoding_key: DecodingKey::from_ec_pem(public_pem)
                .map_err(|e| TokenError::InvalidKey(e.to_string()))?,
            allow,
        })
    }

    /// Create an Ed25519 service (EdDSA).
    pub fn ed25519(
        private_pem: &[u8],
        public_pem: &[u8],
        allow: AllowedFamilies,
    ) -> Result<Self, TokenError> {
        Ok(Self {
            method: Algorithm::EdDSA,
            encoding_key: EncodingKey::from_ed_pem(private_pem)
                .map_err(|e| TokenError::InvalidKey(e.to_string()))?,
            decoding_key: DecodingKey::from_ed_pem(public_pem)
                .map_err(|e| TokenError::InvalidKey(e.to_string()))?,
            allow,
        })
    }

    /// Build a service from validated configuration.
    ///
    /// Key-material problems surface here, at startup, rather than as
    /// per-request failures.
    pub fn from_config(auth: &AuthConfig) -> Result<Self, ConfigError> {
        let method = auth.method()?;
        let allow = auth.families()?;
        let key = auth.signing_key.as_bytes();

        let service = match AlgorithmFamily::of(method) {
            AlgorithmFamily::Hmac => Self::hmac(method, key, allow),
            AlgorithmFamily::Rsa | AlgorithmFamily::RsaPss => {
                Self::rsa(method, key, auth.public_key_bytes()?, allow)
            }
            AlgorithmFamily::Ecdsa => Self::ecdsa(method, key, auth.public_key_bytes()?, allow),
            AlgorithmFamily::Ed25519 => Self::ed25519(key, auth.public_key_bytes()?, allow),
        };

        service.map_err(|e| ConfigError::ValidationError(e.to_string()))
    }

    fn expect_family(method: Algorithm, want: AlgorithmFamily) -> Result<(), TokenError> {
        if AlgorithmFamily::of(method) != want {
            return Err(TokenError::InvalidKey(format!(
                "{:?} is not a {} method",
                method, want
            )));
        }
        Ok(())
    }

    /// Issue a signed token for the provider's claims.
    ///
    /// `iat` and `nbf` are set to the current time and `exp` to now plus
    /// `expiry`. Reserved keys always overwrite caller-supplied values.
    pub fn issue(
        &self,
        provider: &dyn ClaimsProvider,
        expiry: Duration,
    ) -> Result<String, TokenError> {
        let mut claims = provider.claims();
        let now = Utc::now().timestamp();
        // An expiry beyond i64 seconds clamps instead of wrapping into the past.
        let expiry_secs = i64::try_from(expiry.as_secs()).unwrap_or(i64::MAX);
        claims.insert("iat".into(), json!(now));
        claims.insert("nbf".into(), json!(now));
        claims.insert("exp".into(), json!(now.saturating_add(expiry_secs)));

        encode(&Header::new(self.method), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Validate a token string and return its full claims mapping.
    ///
    /// The declared algorithm's family is checked against the allow-list
    /// before any cryptographic work, so an attacker-selected algorithm is
    /// rejected on policy alone. Expiry and not-before are enforced
    /// explicitly with zero leeway.
    pub fn validate(&self, token: &str) -> Result<HashMap<String, Value>, TokenError> {
        let header = decode_header(token).map_err(|_| TokenError::Malformed)?;

        let family = AlgorithmFamily::of(header.alg);
        if !self.allow.contains(family) {
            return Err(TokenError::AlgorithmNotAllowed(family));
        }

        let mut validation = Validation::new(header.alg);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = 0;
        validation.validate_aud = false; // audience is a caller-level concern
        validation.set_required_spec_claims(&["exp"]);

        let data = decode::<HashMap<String, Value>>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                jsonwebtoken::errors::ErrorKind::ImmatureSignature => TokenError::NotYetValid,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                // The declared algorithm passed policy but does not fit the
                // configured key, so the signature cannot verify.
                jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            })?;

        Ok(data.claims)
    }
}
