//! Port abstraction for account persistence adapters and their errors.
use async_trait::async_trait;

use crate::domain::{AvatarUrl, EmailAddress, PasswordDigest, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// Another account already uses the email address.
        DuplicateEmail { email: String } => "email already registered: {email}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account; fails with `DuplicateEmail` on a taken address.
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch a user by case-folded email.
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch every known user among `ids`; unknown ids are skipped.
    async fn find_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>, UserPersistenceError>;

    /// Replace the stored password digest. Returns `false` for unknown users.
    async fn update_password(
        &self,
        id: &UserId,
        digest: &PasswordDigest,
    ) -> Result<bool, UserPersistenceError>;

    /// Replace or clear the avatar reference. Returns `false` for unknown users.
    async fn update_avatar(
        &self,
        id: &UserId,
        avatar: Option<AvatarUrl>,
    ) -> Result<bool, UserPersistenceError>;
}
