//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{AccountService, CredentialRecovery, ListCommand, ListQuery};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: Arc<dyn AccountService>,
    pub recovery: Arc<dyn CredentialRecovery>,
    pub lists: Arc<dyn ListCommand>,
    pub lists_query: Arc<dyn ListQuery>,
}

impl HttpState {
    /// Construct state from explicit port implementations.
    ///
    /// # Examples
    /// ```no_run
    /// use std::sync::Arc;
    ///
    /// use mockable::DefaultClock;
    /// use synclist::domain::ports::NoOpListEventPublisher;
    /// use synclist::domain::{AccountManager, ListService, PasswordRecovery, RecoveryPorts};
    /// use synclist::inbound::http::state::HttpState;
    /// use synclist::outbound::mail::LogMailTransport;
    /// use synclist::outbound::memory::InMemoryStore;
    /// use synclist::outbound::security::{Argon2PasswordHasher, JwtCredentialTokens};
    ///
    /// let store = Arc::new(InMemoryStore::default());
    /// let hasher = Arc::new(Argon2PasswordHasher::default());
    /// let lists = Arc::new(ListService::new(
    ///     store.clone(),
    ///     store.clone(),
    ///     Arc::new(NoOpListEventPublisher),
    ///     Arc::new(DefaultClock),
    /// ));
    /// let recovery = PasswordRecovery::new(RecoveryPorts {
    ///     users: store.clone(),
    ///     codes: store.clone(),
    ///     hasher: hasher.clone(),
    ///     tokens: Arc::new(JwtCredentialTokens::new(b"secret")),
    ///     mail: Arc::new(LogMailTransport),
    ///     clock: Arc::new(DefaultClock),
    /// });
    /// let state = HttpState::new(
    ///     Arc::new(AccountManager::new(store, hasher)),
    ///     Arc::new(recovery),
    ///     lists.clone(),
    ///     lists,
    /// );
    /// let _accounts = state.accounts.clone();
    /// ```
    pub fn new(
        accounts: Arc<dyn AccountService>,
        recovery: Arc<dyn CredentialRecovery>,
        lists: Arc<dyn ListCommand>,
        lists_query: Arc<dyn ListQuery>,
    ) -> Self {
        Self {
            accounts,
            recovery,
            lists,
            lists_query,
        }
    }
}
