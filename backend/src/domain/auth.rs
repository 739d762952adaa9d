//! Authentication primitives: login credentials, registrations and new
//! passwords.
//!
//! Inbound adapters hand raw strings to these constructors so validation
//! happens once, before any port or service is called.

use zeroize::Zeroizing;

use super::user::{EmailAddress, UserValidationError, Username};

/// Minimum number of characters accepted for a new password.
pub const PASSWORD_MIN: usize = 8;
/// Maximum number of characters accepted for a new password.
pub const PASSWORD_MAX: usize = 128;

/// Validation failures for authentication payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialValidationError {
    #[error(transparent)]
    User(#[from] UserValidationError),
    #[error("password must not be empty")]
    EmptyPassword,
    #[error("password must be between {min} and {max} characters")]
    PasswordLength { min: usize, max: usize },
}

impl CredentialValidationError {
    /// Request field the failure relates to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::User(
                UserValidationError::EmptyEmail
                | UserValidationError::InvalidEmail
                | UserValidationError::EmailTooLong { .. },
            ) => "email",
            Self::User(
                UserValidationError::EmptyUsername
                | UserValidationError::UsernameTooLong { .. }
                | UserValidationError::UsernameControlCharacters,
            ) => "username",
            Self::User(UserValidationError::InvalidAvatarUrl) => "avatarUrl",
            Self::User(UserValidationError::InvalidId) => "id",
            Self::EmptyPassword | Self::PasswordLength { .. } => "password",
        }
    }
}

/// Plaintext password that satisfies the password policy.
///
/// Zeroed on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct NewPassword(Zeroizing<String>);

impl NewPassword {
    /// Validate a candidate password against the length policy.
    pub fn new(raw: &str) -> Result<Self, CredentialValidationError> {
        let length = raw.chars().count();
        if !(PASSWORD_MIN..=PASSWORD_MAX).contains(&length) {
            return Err(CredentialValidationError::PasswordLength {
                min: PASSWORD_MIN,
                max: PASSWORD_MAX,
            });
        }
        Ok(Self(Zeroizing::new(raw.to_owned())))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Debug for NewPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("NewPassword(..)")
    }
}

/// Validated login credentials used by the account service.
///
/// # Examples
/// ```
/// use synclist::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" Ada@Example.com", "hunter22").unwrap();
/// assert_eq!(creds.email().as_ref(), "ada@example.com");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: EmailAddress,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    ///
    /// The password keeps caller-provided whitespace.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialValidationError> {
        let email = EmailAddress::new(email)?;
        if password.is_empty() {
            return Err(CredentialValidationError::EmptyPassword);
        }
        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

impl std::fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Sign-up request accepted by the account service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub email: EmailAddress,
    pub username: Username,
    pub password: NewPassword,
}

impl Registration {
    pub fn try_from_parts(
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<Self, CredentialValidationError> {
        Ok(Self {
            email: EmailAddress::new(email)?,
            username: Username::new(username)?,
            password: NewPassword::new(password)?,
        })
    }
}
