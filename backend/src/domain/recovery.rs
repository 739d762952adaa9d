//! Credential recovery service implementing the `CredentialRecovery` port.
//!
//! Flow per email address: a six-digit code is issued and mailed, a live code
//! is exchanged exactly once for a signed reset credential, and the credential
//! authorises one password replacement. Codes are stored as digests only.
//! Validity windows are measured against the injected clock. Repeated
//! wrong guesses lock verification for an address until the window in which
//! they started has passed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use rand::rngs::OsRng;
use tracing::{debug, info, warn};

use crate::domain::account_service::{map_hasher_error, map_user_error};
use crate::domain::ports::{
    CredentialRecovery, CredentialTokenError, CredentialTokens, MailMessage, MailTransport,
    MailTransportError, OneTimeCodeRecord, OneTimeCodeRepository, OneTimeCodeRepositoryError,
    PasswordHasher, TokenClaims, TokenPurpose, UserRepository,
};
use crate::domain::{EmailAddress, Error, ErrorCode, NewPassword, OneTimeCode, ResetToken, User};

/// How long an issued code may be verified.
pub const CODE_TTL: TimeDelta = TimeDelta::minutes(5);
/// Lifetime of a reset credential.
pub const RESET_TOKEN_TTL: TimeDelta = TimeDelta::minutes(15);

/// Rejected verifications tolerated per address within one code window.
pub const MAX_FAILED_VERIFICATIONS: u32 = 5;

const CODE_SUBJECT: &str = "Your password reset code";

fn map_code_error(error: OneTimeCodeRepositoryError) -> Error {
    match error {
        OneTimeCodeRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("code repository unavailable: {message}"))
        }
        OneTimeCodeRepositoryError::Query { message } => {
            Error::internal(format!("code repository error: {message}"))
        }
    }
}

fn map_mail_error(error: MailTransportError) -> Error {
    Error::service_unavailable(format!("could not send recovery mail: {error}"))
}

fn map_token_error(error: CredentialTokenError) -> Error {
    match error {
        CredentialTokenError::Signing { message } => {
            Error::internal(format!("could not sign reset credential: {message}"))
        }
        CredentialTokenError::Invalid { .. } => {
            Error::invalid_or_expired("reset credential is invalid or expired")
        }
    }
}

fn code_rejected() -> Error {
    Error::invalid_or_expired("code is invalid or expired")
}

fn code_message(to: EmailAddress, code: &OneTimeCode) -> MailMessage {
    MailMessage {
        to,
        subject: CODE_SUBJECT.to_owned(),
        body: format!(
            "Your password reset code is {}. It expires in {} minutes.",
            code.expose(),
            CODE_TTL.num_minutes()
        ),
    }
}

#[derive(Debug, Clone, Copy)]
struct Strikes {
    count: u32,
    since: DateTime<Utc>,
}

/// Per-address count of rejected verifications.
///
/// A count lapses once `CODE_TTL` has passed since its first strike.
#[derive(Debug, Default)]
struct FailedVerifications(Mutex<HashMap<EmailAddress, Strikes>>);

impl FailedVerifications {
    fn is_locked(&self, email: &EmailAddress, now: DateTime<Utc>) -> bool {
        let mut strikes = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        match strikes.get(email) {
            Some(entry) if now - entry.since > CODE_TTL => {
                strikes.remove(email);
                false
            }
            Some(entry) => entry.count >= MAX_FAILED_VERIFICATIONS,
            None => false,
        }
    }

    fn record(&self, email: &EmailAddress, now: DateTime<Utc>) -> u32 {
        let mut strikes = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = strikes.entry(email.clone()).or_insert(Strikes {
            count: 0,
            since: now,
        });
        if now - entry.since > CODE_TTL {
            *entry = Strikes {
                count: 0,
                since: now,
            };
        }
        entry.count += 1;
        entry.count
    }

    fn clear(&self, email: &EmailAddress) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(email);
    }
}

/// Collaborators of the recovery flow.
pub struct RecoveryPorts<U, C, H> {
    pub users: Arc<U>,
    pub codes: Arc<C>,
    pub hasher: Arc<H>,
    pub tokens: Arc<dyn CredentialTokens>,
    pub mail: Arc<dyn MailTransport>,
    pub clock: Arc<dyn Clock>,
}

/// Service driving the out-of-band password recovery flow.
pub struct PasswordRecovery<U, C, H> {
    users: Arc<U>,
    codes: Arc<C>,
    hasher: Arc<H>,
    tokens: Arc<dyn CredentialTokens>,
    mail: Arc<dyn MailTransport>,
    clock: Arc<dyn Clock>,
    failures: FailedVerifications,
}

impl<U, C, H> PasswordRecovery<U, C, H>
where
    U: UserRepository,
    C: OneTimeCodeRepository,
    H: PasswordHasher,
{
    pub fn new(ports: RecoveryPorts<U, C, H>) -> Self {
        let RecoveryPorts {
            users,
            codes,
            hasher,
            tokens,
            mail,
            clock,
        } = ports;
        Self {
            users,
            codes,
            hasher,
            tokens,
            mail,
            clock,
            failures: FailedVerifications::default(),
        }
    }

    async fn user_by_email(&self, email: &EmailAddress) -> Result<Option<User>, Error> {
        self.users
            .find_by_email(email)
            .await
            .map_err(map_user_error)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) {
        match self.codes.purge_created_before(now - CODE_TTL).await {
            Ok(0) => {}
            Ok(purged) => debug!(purged, "purged expired recovery codes"),
            Err(error) => warn!(error = %error, kind = error.kind(), "recovery code purge failed"),
        }
    }

    /// Consume a live code matching `email`.
    async fn redeem(
        &self,
        email: &EmailAddress,
        code: &OneTimeCode,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        let digest = code.digest_for(email);
        let record = self
            .codes
            .find(email, &digest)
            .await
            .map_err(map_code_error)?
            .ok_or_else(code_rejected)?;
        if now - record.created_at > CODE_TTL {
            debug!("recovery code presented after expiry");
            return Err(code_rejected());
        }
        if !self
            .codes
            .consume(email, &digest)
            .await
            .map_err(map_code_error)?
        {
            debug!("recovery code already spent");
            return Err(code_rejected());
        }
        Ok(())
    }

    fn issue_token(&self, user: &User, now: DateTime<Utc>) -> Result<ResetToken, Error> {
        let claims = TokenClaims {
            subject: user.id(),
            purpose: TokenPurpose::PasswordReset,
            issued_at: now,
            expires_at: now + RESET_TOKEN_TTL,
        };
        self.tokens
            .issue(&claims)
            .map(ResetToken::new)
            .map_err(map_token_error)
    }

    fn check_claims(&self, claims: &TokenClaims) -> Result<(), Error> {
        if claims.purpose != TokenPurpose::PasswordReset {
            debug!(user_id = %claims.subject, purpose = ?claims.purpose, "credential purpose mismatch");
            return Err(Error::invalid_or_expired(
                "reset credential is invalid or expired",
            ));
        }
        if self.clock.utc() > claims.expires_at {
            debug!(user_id = %claims.subject, "reset credential expired");
            return Err(Error::invalid_or_expired(
                "reset credential is invalid or expired",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl<U, C, H> CredentialRecovery for PasswordRecovery<U, C, H>
where
    U: UserRepository,
    C: OneTimeCodeRepository,
    H: PasswordHasher,
{
    async fn request_code(&self, email: &EmailAddress) -> Result<(), Error> {
        let Some(user) = self.user_by_email(email).await? else {
            return Err(Error::not_found("no account for this email"));
        };
        let now = self.clock.utc();
        let code = OneTimeCode::generate(&mut OsRng);
        let record = OneTimeCodeRecord {
            email: user.email().clone(),
            code_digest: code.digest_for(user.email()),
            created_at: now,
        };
        self.codes.insert(&record).await.map_err(map_code_error)?;
        self.purge_expired(now).await;

        self.mail
            .send(&code_message(user.email().clone(), &code))
            .await
            .map_err(|error| {
                warn!(user_id = %user.id(), kind = error.kind(), "recovery mail failed; code retained");
                map_mail_error(error)
            })?;
        info!(user_id = %user.id(), "recovery code issued");
        Ok(())
    }

    async fn verify_code(
        &self,
        email: &EmailAddress,
        code: &OneTimeCode,
    ) -> Result<ResetToken, Error> {
        let now = self.clock.utc();
        if self.failures.is_locked(email, now) {
            debug!("recovery code verification locked after repeated failures");
            return Err(code_rejected());
        }
        match self.redeem(email, code, now).await {
            Ok(()) => self.failures.clear(email),
            Err(error) => {
                if error.code() == ErrorCode::InvalidOrExpired {
                    let count = self.failures.record(email, now);
                    if count == MAX_FAILED_VERIFICATIONS {
                        warn!(failures = count, "recovery code verification locked");
                    }
                }
                return Err(error);
            }
        }
        let user = self.user_by_email(email).await?.ok_or_else(code_rejected)?;
        let token = self.issue_token(&user, now)?;
        info!(user_id = %user.id(), "recovery code verified");
        Ok(token)
    }

    async fn reset_password(&self, token: &ResetToken, password: NewPassword) -> Result<(), Error> {
        let claims = self
            .tokens
            .verify(token.expose())
            .map_err(map_token_error)?;
        self.check_claims(&claims)?;
        let digest = self
            .hasher
            .hash(&password)
            .await
            .map_err(map_hasher_error)?;
        let updated = self
            .users
            .update_password(&claims.subject, &digest)
            .await
            .map_err(map_user_error)?;
        if !updated {
            return Err(Error::invalid_or_expired(
                "reset credential is invalid or expired",
            ));
        }
        info!(user_id = %claims.subject, "password reset");
        Ok(())
    }
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
