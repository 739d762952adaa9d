//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (repositories, hasher, tokens, mail, topics) are implemented
//! in `outbound`; driving ports (`ListCommand`, `ListQuery`, `AccountService`,
//! `CredentialRecovery`) are implemented by domain services and called from
//! `inbound`.

mod macros;
pub(crate) use macros::define_port_error;

mod account_service;
mod credential_tokens;
mod list_command;
mod list_repository;
mod list_topics;
mod mail_transport;
mod one_time_code_repository;
mod password_hasher;
mod user_repository;

pub use account_service::{AccountService, CredentialRecovery};
#[cfg(test)]
pub use account_service::{MockAccountService, MockCredentialRecovery};
#[cfg(test)]
pub use credential_tokens::MockCredentialTokens;
pub use credential_tokens::{CredentialTokenError, CredentialTokens, TokenClaims, TokenPurpose};
pub use list_command::{ListCommand, ListQuery};
#[cfg(test)]
pub use list_command::{MockListCommand, MockListQuery};
#[cfg(test)]
pub use list_repository::MockListRepository;
pub use list_repository::{ClaimWrite, ListRepository, ListRepositoryError};
pub use list_topics::{ListEventPublisher, NoOpListEventPublisher, PublishReport, TopicSubscriptions};
#[cfg(test)]
pub use list_topics::{MockListEventPublisher, MockTopicSubscriptions};
#[cfg(test)]
pub use mail_transport::MockMailTransport;
pub use mail_transport::{MailMessage, MailTransport, MailTransportError};
#[cfg(test)]
pub use one_time_code_repository::MockOneTimeCodeRepository;
pub use one_time_code_repository::{
    OneTimeCodeRecord, OneTimeCodeRepository, OneTimeCodeRepositoryError,
};
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHasher, PasswordHasherError};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserPersistenceError, UserRepository};
