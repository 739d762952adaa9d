//! Account service implementing the `AccountService` driving port.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::domain::ports::{
    AccountService, PasswordHasher, PasswordHasherError, UserPersistenceError, UserRepository,
};
use crate::domain::{
    AvatarUrl, Error, LoginCredentials, Registration, User, UserId, UserProfile,
};

pub(crate) fn map_user_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserPersistenceError::DuplicateEmail { .. } => {
            Error::conflict("an account with this email already exists")
        }
    }
}

pub(crate) fn map_hasher_error(error: PasswordHasherError) -> Error {
    Error::internal(format!("password hashing failed: {error}"))
}

/// Service handling sign-up, login and profile updates.
pub struct AccountManager<U, H> {
    users: Arc<U>,
    hasher: Arc<H>,
}

impl<U, H> AccountManager<U, H>
where
    U: UserRepository,
    H: PasswordHasher,
{
    pub fn new(users: Arc<U>, hasher: Arc<H>) -> Self {
        Self { users, hasher }
    }

    async fn require_user(&self, id: UserId) -> Result<User, Error> {
        self.users
            .find_by_id(&id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found("user not found"))
    }
}

#[async_trait]
impl<U, H> AccountService for AccountManager<U, H>
where
    U: UserRepository,
    H: PasswordHasher,
{
    async fn register(&self, registration: Registration) -> Result<UserProfile, Error> {
        let Registration {
            email,
            username,
            password,
        } = registration;
        let digest = self
            .hasher
            .hash(&password)
            .await
            .map_err(map_hasher_error)?;
        let user = User::new(UserId::random(), email, username, digest);
        self.users.insert(&user).await.map_err(map_user_error)?;
        info!(user_id = %user.id(), "account registered");
        Ok(user.profile())
    }

    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserId, Error> {
        let rejected = || Error::unauthorized("invalid credentials");
        let Some(user) = self
            .users
            .find_by_email(credentials.email())
            .await
            .map_err(map_user_error)?
        else {
            debug!("login for unknown email");
            return Err(rejected());
        };
        let matches = self
            .hasher
            .verify(credentials.password(), user.password())
            .await
            .map_err(map_hasher_error)?;
        if !matches {
            debug!(user_id = %user.id(), "login with wrong password");
            return Err(rejected());
        }
        Ok(user.id())
    }

    async fn profile(&self, user: UserId) -> Result<UserProfile, Error> {
        Ok(self.require_user(user).await?.profile())
    }

    async fn update_avatar(
        &self,
        user: UserId,
        avatar: Option<AvatarUrl>,
    ) -> Result<UserProfile, Error> {
        let updated = self
            .users
            .update_avatar(&user, avatar)
            .await
            .map_err(map_user_error)?;
        if !updated {
            return Err(Error::not_found("user not found"));
        }
        self.profile(user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::{MockPasswordHasher, MockUserRepository};
    use crate::domain::PasswordDigest;
    use crate::outbound::memory::InMemoryStore;

    fn hasher() -> MockPasswordHasher {
        let mut hasher = MockPasswordHasher::new();
        hasher
            .expect_hash()
            .returning(|password| Ok(PasswordDigest::new(format!("digest:{}", password.expose()))));
        hasher
            .expect_verify()
            .returning(|candidate, digest| Ok(digest.as_ref() == format!("digest:{candidate}")));
        hasher
    }

    fn registration(email: &str) -> Registration {
        Registration::try_from_parts(email, "ada", "correct horse").expect("registration")
    }

    #[tokio::test]
    async fn register_then_authenticate() {
        let service = AccountManager::new(Arc::new(InMemoryStore::new()), Arc::new(hasher()));
        let profile = service
            .register(registration("ada@example.com"))
            .await
            .expect("register");

        let credentials =
            LoginCredentials::try_from_parts("ADA@example.com", "correct horse").expect("creds");
        let id = service.authenticate(&credentials).await.expect("login");
        assert_eq!(id, profile.id);
    }

    #[tokio::test]
    async fn duplicate_email_is_conflict() {
        let service = AccountManager::new(Arc::new(InMemoryStore::new()), Arc::new(hasher()));
        service
            .register(registration("ada@example.com"))
            .await
            .expect("register");
        let err = service
            .register(registration("ada@example.com"))
            .await
            .expect_err("duplicate");
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_alike() {
        let service = AccountManager::new(Arc::new(InMemoryStore::new()), Arc::new(hasher()));
        service
            .register(registration("ada@example.com"))
            .await
            .expect("register");

        let wrong = LoginCredentials::try_from_parts("ada@example.com", "nope").expect("creds");
        let unknown = LoginCredentials::try_from_parts("bob@example.com", "nope").expect("creds");
        let first = service.authenticate(&wrong).await.expect_err("wrong");
        let second = service.authenticate(&unknown).await.expect_err("unknown");
        assert_eq!(first.code(), ErrorCode::Unauthorized);
        assert_eq!(first.message(), second.message());
    }

    #[tokio::test]
    async fn avatar_can_be_set_and_cleared() {
        let service = AccountManager::new(Arc::new(InMemoryStore::new()), Arc::new(hasher()));
        let profile = service
            .register(registration("ada@example.com"))
            .await
            .expect("register");
        let avatar = AvatarUrl::new("https://cdn.example.com/a.png").expect("url");

        let updated = service
            .update_avatar(profile.id, Some(avatar.clone()))
            .await
            .expect("set");
        assert_eq!(updated.avatar_url, Some(avatar));
        let cleared = service
            .update_avatar(profile.id, None)
            .await
            .expect("clear");
        assert!(cleared.avatar_url.is_none());
    }

    #[tokio::test]
    async fn hashing_failures_are_internal() {
        let mut failing = MockPasswordHasher::new();
        failing
            .expect_hash()
            .return_once(|_| Err(PasswordHasherError::hashing("out of memory")));
        let service = AccountManager::new(Arc::new(MockUserRepository::new()), Arc::new(failing));

        let err = service
            .register(registration("ada@example.com"))
            .await
            .expect_err("hash failure");
        assert_eq!(err.code(), ErrorCode::InternalError);
    }
}
