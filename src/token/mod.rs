//! Token issuance and validation
//!
//! Issues signed JWTs from any claims-bearing entity and validates incoming
//! tokens against an explicit signing-method allow-list. The allow-list is
//! checked against the token's declared algorithm *before* any signature
//! verification happens.

use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

pub mod allow;
mod service;

pub use allow::{AlgorithmFamily, AllowedFamilies, UnknownFamily};
pub use service::TokenService;

/// Token errors
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Malformed token")]
    Malformed,

    #[error("Signing method family {0} is not allowed")]
    AlgorithmNotAllowed(AlgorithmFamily),

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,

    #[error("Token not yet valid")]
    NotYetValid,
}

/// Any entity able to describe itself as a flat claims mapping.
///
/// The token service never depends on a concrete identity type; a user
/// record, a service account, or an ad-hoc CLI invocation all qualify.
pub trait ClaimsProvider {
    fn claims(&self) -> HashMap<String, Value>;
}
