//! Token-based authorization.
//!
//! Tokens carry progressively richer claims: a subject first, then the units
//! the respondent belongs to, then questionnaires nested under a unit. Each
//! enrichment step re-issues a new token; nothing is kept server-side.

pub mod accumulator;
mod claims;
mod codec;
mod config;
mod error;
mod validator;

pub use claims::{Claims, ClaimsShape, Subject, UnitGrant};
pub use codec::TokenCodec;
pub use config::{AuthConfig, ConfigValidationError, PLACEHOLDER_SECRET};
pub use error::AuthError;
pub use validator::{AuthState, Authorized, TOKEN_HEADER, token_from_headers};
