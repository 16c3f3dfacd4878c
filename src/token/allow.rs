//! Signing-method allow-list
//!
//! Every concrete JWT algorithm maps to exactly one family, and validation
//! policy is expressed in terms of families. The mapping is a total match so
//! a new algorithm variant cannot be forgotten silently.

use jsonwebtoken::Algorithm;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A family name that is not one of the five known families.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown signing method family: {0}")]
pub struct UnknownFamily(pub String);

/// Cryptographic algorithm families recognized during validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmFamily {
    Hmac,
    Rsa,
    RsaPss,
    Ecdsa,
    Ed25519,
}

impl AlgorithmFamily {
    /// Family of a concrete JWT algorithm.
    pub fn of(alg: Algorithm) -> Self {
        match alg {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Self::Hmac,
            Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512 => Self::Rsa,
            Algorithm::PS256 | Algorithm::PS384 | Algorithm::PS512 => Self::RsaPss,
            Algorithm::ES256 | Algorithm::ES384 => Self::Ecdsa,
            Algorithm::EdDSA => Self::Ed25519,
        }
    }
}

impl fmt::Display for AlgorithmFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Hmac => "HMAC",
            Self::Rsa => "RSA",
            Self::RsaPss => "RSAPSS",
            Self::Ecdsa => "ECDSA",
            Self::Ed25519 => "Ed25519",
        };
        f.write_str(name)
    }
}

impl FromStr for AlgorithmFamily {
    type Err = UnknownFamily;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "HMAC" => Ok(Self::Hmac),
            "RSA" => Ok(Self::Rsa),
            "RSAPSS" => Ok(Self::RsaPss),
            "ECDSA" => Ok(Self::Ecdsa),
            "ED25519" | "EDDSA" => Ok(Self::Ed25519),
            _ => Err(UnknownFamily(s.to_string())),
        }
    }
}

/// Set of algorithm families trusted when validating an incoming token.
///
/// Deliberately separate from the method used to issue tokens: a validator
/// may need to accept tokens signed by a different trusted issuer, or older
/// tokens during a key rotation, while still refusing adversarially chosen
/// algorithms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllowedFamilies {
    hmac: bool,
    rsa: bool,
    rsa_pss: bool,
    ecdsa: bool,
    ed25519: bool,
}

impl AllowedFamilies {
    /// An allow-list that rejects everything.
    pub fn empty() -> Self {
        Self::default()
    }

    /// An allow-list containing a single family.
    pub fn only(family: AlgorithmFamily) -> Self {
        Self::empty().allow(family)
    }

    /// Add a family to the set.
    #[must_use]
    pub fn allow(mut self, family: AlgorithmFamily) -> Self {
        match family {
            AlgorithmFamily::Hmac => self.hmac = true,
            AlgorithmFamily::Rsa => self.rsa = true,
            AlgorithmFamily::RsaPss => self.rsa_pss = true,
            AlgorithmFamily::Ecdsa => self.ecdsa = true,
            AlgorithmFamily::Ed25519 => self.ed25519 = true,
        }
        self
    }

    /// Whether a family is trusted.
    pub fn contains(&self, family: AlgorithmFamily) -> bool {
        match family {
            AlgorithmFamily::Hmac => self.hmac,
            AlgorithmFamily::Rsa => self.rsa,
            AlgorithmFamily::RsaPss => self.rsa_pss,
            AlgorithmFamily::Ecdsa => self.ecdsa,
            AlgorithmFamily::Ed25519 => self.ed25519,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl FromStr for AllowedFamilies {
    type Err = UnknownFamily;

    /// Parse the comma-separated configuration syntax, e.g. `"HMAC,ECDSA"`.
    ///
    /// An unrecognized family name is a hard error, never a silent no-op.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut set = Self::empty();
        for name in s.split(',') {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            set = set.allow(name.parse()?);
        }
        Ok(set)
    }
}
