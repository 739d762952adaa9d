//! One-time recovery codes and the reset credential they are exchanged for.

use std::fmt;

use rand::Rng;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::user::EmailAddress;

/// Number of digits in a recovery code.
pub const CODE_DIGITS: usize = 6;

/// Validation failures for user-supplied codes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OneTimeCodeError {
    #[error("code must be exactly {digits} digits")]
    Malformed { digits: usize },
}

/// Six-digit numeric code, leading zeros included.
#[derive(Clone, PartialEq, Eq)]
pub struct OneTimeCode(Zeroizing<String>);

impl OneTimeCode {
    /// Parse a code typed by a user.
    pub fn parse(raw: &str) -> Result<Self, OneTimeCodeError> {
        let value = raw.trim();
        if value.len() != CODE_DIGITS || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(OneTimeCodeError::Malformed {
                digits: CODE_DIGITS,
            });
        }
        Ok(Self(Zeroizing::new(value.to_owned())))
    }

    /// Draw a uniformly distributed code.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let value: u32 = rng.gen_range(0..1_000_000);
        Self(Zeroizing::new(format!("{value:06}")))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// Storage digest binding this code to `email`.
    ///
    /// # Examples
    /// ```
    /// use synclist::domain::{EmailAddress, OneTimeCode};
    ///
    /// let email = EmailAddress::new("ada@example.com").unwrap();
    /// let code = OneTimeCode::parse("004217").unwrap();
    /// assert_eq!(code.digest_for(&email).len(), 64);
    /// ```
    pub fn digest_for(&self, email: &EmailAddress) -> String {
        let mut hasher = Sha256::new();
        hasher.update(email.as_ref().as_bytes());
        hasher.update(b":");
        hasher.update(self.0.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl fmt::Debug for OneTimeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OneTimeCode(..)")
    }
}

/// Signed, short-lived credential authorising a single password reset.
#[derive(Clone, PartialEq, Eq)]
pub struct ResetToken(Zeroizing<String>);

impl ResetToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Zeroizing::new(token.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for ResetToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ResetToken(..)")
    }
}
