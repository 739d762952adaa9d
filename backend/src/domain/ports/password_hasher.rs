//! Port for password hashing primitives.

use async_trait::async_trait;

use crate::domain::{NewPassword, PasswordDigest};

use super::define_port_error;

define_port_error! {
    /// Errors raised by password hashers.
    pub enum PasswordHasherError {
        /// Producing a digest failed.
        Hashing { message: String } => "password hashing failed: {message}",
        /// A stored digest could not be parsed.
        MalformedDigest { message: String } => "stored password digest is malformed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash(&self, password: &NewPassword) -> Result<PasswordDigest, PasswordHasherError>;

    /// Check `candidate` against `digest`; a mismatch is `Ok(false)`.
    async fn verify(
        &self,
        candidate: &str,
        digest: &PasswordDigest,
    ) -> Result<bool, PasswordHasherError>;
}
