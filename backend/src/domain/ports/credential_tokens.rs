//! Port for signing and verifying scoped, stateless credentials.
//!
//! Implementations check the signature only. Expiry and purpose are enforced
//! by the caller against its own clock so tests can control time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::UserId;

use super::define_port_error;

define_port_error! {
    /// Errors raised by credential token adapters.
    pub enum CredentialTokenError {
        /// The token could not be produced.
        Signing { message: String } => "credential signing failed: {message}",
        /// The token is malformed or its signature does not verify.
        Invalid { message: String } => "credential rejected: {message}",
    }
}

/// Single operation a credential authorises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    PasswordReset,
}

/// Claims carried by a scoped credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub subject: UserId,
    pub purpose: TokenPurpose,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[cfg_attr(test, mockall::automock)]
pub trait CredentialTokens: Send + Sync {
    fn issue(&self, claims: &TokenClaims) -> Result<String, CredentialTokenError>;

    fn verify(&self, token: &str) -> Result<TokenClaims, CredentialTokenError>;
}
