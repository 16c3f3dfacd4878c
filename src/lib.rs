//! Tokengate Library
//!
//! JWT issuance and validation with an explicit signing-method allow-list,
//! plus a bearer authorization gate for HTTP middleware.
//!
//! # Design
//!
//! - **Issue** signs the claims of any [`token::ClaimsProvider`] with one
//!   fixed method and key.
//! - **Validate** checks the token's declared algorithm family against an
//!   allow-list *before* any signature verification, closing off
//!   algorithm-confusion attacks, then enforces signature, `exp` and `nbf`.
//! - **Authorize** extracts a bearer credential, validates it, resolves the
//!   identity claim through an external lookup, and admits or rejects with
//!   a single opaque outcome.
//!
//! # Example
//!
//! ```
//! use jsonwebtoken::Algorithm;
//! use tokengate::token::{AlgorithmFamily, AllowedFamilies, TokenService};
//!
//! let service = TokenService::hmac(
//!     Algorithm::HS256,
//!     b"signing-key",
//!     AllowedFamilies::only(AlgorithmFamily::Hmac),
//! )?;
//! # Ok::<(), tokengate::token::TokenError>(())
//! ```

pub mod config;
pub mod gate;
pub mod token;

// Re-export commonly used types
pub use config::Config;
pub use gate::AuthGate;
pub use token::TokenService;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
