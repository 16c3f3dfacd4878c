//! Bearer authorization gate
//!
//! Middleware-level contract: extract the bearer credential, validate it,
//! resolve the identity claim to a concrete principal, and admit or reject.
//! Every internal failure collapses to a single opaque rejection; the error
//! kind is logged but never echoed to the caller.

use crate::token::TokenService;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Identity lookup failures
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Principal not found")]
    NotFound,

    #[error("Identity lookup unavailable: {0}")]
    Unavailable(String),
}

/// External identity-lookup collaborator.
///
/// Maps the token's identity claim to an application-level principal. The
/// lookup may block or fail independently of the gate, so calls are bounded
/// by a request-scoped timeout.
#[async_trait]
pub trait PrincipalResolver: Send + Sync {
    type Principal: Send;

    async fn resolve(&self, identity: &str) -> Result<Self::Principal, ResolveError>;
}

/// Request shape seen by the gate
///
/// Header names are expected lowercased; the gate stays independent of any
/// particular HTTP framework.
#[derive(Debug)]
pub struct GateRequest {
    pub headers: HashMap<String, String>,
    pub method: String,
    pub path: String,
}

/// Authorization outcome
///
/// `Rejected` carries no reason on purpose: authentication failures must be
/// indistinguishable from the outside.
#[derive(Debug)]
pub enum Outcome<P> {
    Admitted {
        principal: P,
        claims: HashMap<String, Value>,
    },
    Rejected,
}

impl<P> Outcome<P> {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted { .. })
    }
}

/// Extract the bearer token from the request.
///
/// A missing header degrades to an empty token so validation fails through
/// the same path as any other bad credential. The `Bearer ` prefix is
/// stripped only when present.
fn bearer_token(request: &GateRequest) -> &str {
    let value = request
        .headers
        .get("authorization")
        .map(String::as_str)
        .unwrap_or("");
    value.strip_prefix("Bearer ").unwrap_or(value)
}

/// Authorization gate
pub struct AuthGate<R: PrincipalResolver> {
    tokens: Arc<TokenService>,
    resolver: R,
    identity_claim: String,
    resolver_timeout: Duration,
}

impl<R: PrincipalResolver> AuthGate<R> {
    pub fn new(tokens: Arc<TokenService>, resolver: R, resolver_timeout: Duration) -> Self {
        Self {
            tokens,
            resolver,
            identity_claim: "username".into(),
            resolver_timeout,
        }
    }

    /// Use a different claim as the identity discriminator.
    #[must_use]
    pub fn with_identity_claim(mut self, claim: &str) -> Self {
        self.identity_claim = claim.into();
        self
    }

    /// Evaluate a request. Single shot: every rejection is terminal.
    pub async fn authorize(&self, request: &GateRequest) -> Outcome<R::Principal> {
        let token = bearer_token(request);

        let claims = match self.tokens.validate(token) {
            Ok(claims) => claims,
            Err(e) => {
                warn!(
                    method = %request.method,
                    path = %request.path,
                    error = %e,
                    "token rejected"
                );
                return Outcome::Rejected;
            }
        };

        // A correctly signed token without a usable identity claim is
        // treated exactly like an invalid one.
        let identity = match claims.get(&self.identity_claim).and_then(Value::as_str) {
            Some(identity) => identity.to_owned(),
            None => {
                warn!(
                    method = %request.method,
                    path = %request.path,
                    claim = %self.identity_claim,
                    "identity claim missing or not a string"
                );
                return Outcome::Rejected;
            }
        };

        match tokio::time::timeout(self.resolver_timeout, self.resolver.resolve(&identity)).await {
            Ok(Ok(principal)) => Outcome::Admitted { principal, claims },
            Ok(Err(e)) => {
                warn!(identity = %identity, error = %e, "identity lookup failed");
                Outcome::Rejected
            }
            Err(_) => {
                warn!(identity = %identity, "identity lookup timed out");
                Outcome::Rejected
            }
        }
    }
}
