//! Port for one-time recovery code storage.
//!
//! Only digests of codes are handed to adapters. Several live records may
//! exist per email; consumption deletes exactly the matching record and must
//! be conditional so that two racing verifications cannot both succeed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::EmailAddress;

use super::define_port_error;

define_port_error! {
    /// Errors raised by one-time code repository adapters.
    pub enum OneTimeCodeRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "code repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "code repository query failed: {message}",
    }
}

/// Stored one-time code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneTimeCodeRecord {
    pub email: EmailAddress,
    /// Hex SHA-256 digest binding the code to the email.
    pub code_digest: String,
    pub created_at: DateTime<Utc>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OneTimeCodeRepository: Send + Sync {
    async fn insert(&self, record: &OneTimeCodeRecord) -> Result<(), OneTimeCodeRepositoryError>;

    /// Newest record matching the email and digest.
    async fn find(
        &self,
        email: &EmailAddress,
        code_digest: &str,
    ) -> Result<Option<OneTimeCodeRecord>, OneTimeCodeRepositoryError>;

    /// Delete the matching record. Returns `false` when nothing was deleted.
    async fn consume(
        &self,
        email: &EmailAddress,
        code_digest: &str,
    ) -> Result<bool, OneTimeCodeRepositoryError>;

    /// Delete records created strictly before `cutoff`; returns the count.
    async fn purge_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, OneTimeCodeRepositoryError>;
}
