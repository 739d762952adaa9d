//! Driving ports for account management and credential recovery.

use async_trait::async_trait;

use crate::domain::{
    AvatarUrl, EmailAddress, Error, LoginCredentials, NewPassword, OneTimeCode, Registration,
    ResetToken, UserId, UserProfile,
};

/// Use-case port for sign-up, login and profile maintenance.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Create an account; a taken email is a conflict.
    async fn register(&self, registration: Registration) -> Result<UserProfile, Error>;

    /// Validate credentials and return the authenticated user id.
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserId, Error>;

    async fn profile(&self, user: UserId) -> Result<UserProfile, Error>;

    /// Store or clear the avatar reference.
    async fn update_avatar(
        &self,
        user: UserId,
        avatar: Option<AvatarUrl>,
    ) -> Result<UserProfile, Error>;
}

/// Use-case port for the out-of-band password recovery flow.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialRecovery: Send + Sync {
    /// Issue a one-time code and mail it to the account's address.
    async fn request_code(&self, email: &EmailAddress) -> Result<(), Error>;

    /// Exchange a live code for a reset credential. The code is spent.
    async fn verify_code(
        &self,
        email: &EmailAddress,
        code: &OneTimeCode,
    ) -> Result<ResetToken, Error>;

    /// Replace the password of the user bound to the credential.
    async fn reset_password(&self, token: &ResetToken, password: NewPassword)
    -> Result<(), Error>;
}
