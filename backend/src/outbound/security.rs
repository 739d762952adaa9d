//! Credential primitives: Argon2id password hashing and HS256 reset tokens.

use argon2::password_hash::{self, PasswordHash, SaltString};
use argon2::{Argon2, Params, PasswordHasher as _, PasswordVerifier as _};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::ports::{
    CredentialTokenError, CredentialTokens, PasswordHasher, PasswordHasherError, TokenClaims,
    TokenPurpose,
};
use crate::domain::{NewPassword, PasswordDigest, UserId};

/// Argon2id hasher running on the blocking thread pool.
#[derive(Debug, Clone, Default)]
pub struct Argon2PasswordHasher {
    params: Params,
}

impl Argon2PasswordHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use explicit cost parameters, e.g. cheaper ones in tests.
    pub fn with_params(params: Params) -> Self {
        Self { params }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(
            argon2::Algorithm::Argon2id,
            argon2::Version::V0x13,
            self.params.clone(),
        )
    }
}

fn join_error(error: tokio::task::JoinError) -> PasswordHasherError {
    PasswordHasherError::hashing(format!("hashing task failed: {error}"))
}

#[async_trait]
impl PasswordHasher for Argon2PasswordHasher {
    async fn hash(&self, password: &NewPassword) -> Result<PasswordDigest, PasswordHasherError> {
        let password = password.clone();
        let argon2 = self.argon2();
        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            argon2
                .hash_password(password.expose().as_bytes(), &salt)
                .map(|hash| PasswordDigest::new(hash.to_string()))
                .map_err(|error| PasswordHasherError::hashing(error.to_string()))
        })
        .await
        .map_err(join_error)?
    }

    async fn verify(
        &self,
        candidate: &str,
        digest: &PasswordDigest,
    ) -> Result<bool, PasswordHasherError> {
        let candidate = zeroize::Zeroizing::new(candidate.to_owned());
        let digest = digest.clone();
        let argon2 = self.argon2();
        tokio::task::spawn_blocking(move || {
            let parsed = PasswordHash::new(digest.as_ref())
                .map_err(|error| PasswordHasherError::malformed_digest(error.to_string()))?;
            match argon2.verify_password(candidate.as_bytes(), &parsed) {
                Ok(()) => Ok(true),
                Err(password_hash::Error::Password) => Ok(false),
                Err(error) => Err(PasswordHasherError::hashing(error.to_string())),
            }
        })
        .await
        .map_err(join_error)?
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireClaims {
    sub: Uuid,
    purpose: TokenPurpose,
    iat: i64,
    exp: i64,
}

fn timestamp(seconds: i64, field: &str) -> Result<DateTime<Utc>, CredentialTokenError> {
    DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| CredentialTokenError::invalid(format!("{field} out of range")))
}

/// HS256 signer for scoped credentials.
///
/// Only the signature and claim shape are checked here; `exp` is left to the
/// caller's clock.
pub struct JwtCredentialTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtCredentialTokens {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["sub", "exp"]);
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

impl CredentialTokens for JwtCredentialTokens {
    fn issue(&self, claims: &TokenClaims) -> Result<String, CredentialTokenError> {
        let wire = WireClaims {
            sub: *claims.subject.as_uuid(),
            purpose: claims.purpose,
            iat: claims.issued_at.timestamp(),
            exp: claims.expires_at.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &wire, &self.encoding)
            .map_err(|error| CredentialTokenError::signing(error.to_string()))
    }

    fn verify(&self, token: &str) -> Result<TokenClaims, CredentialTokenError> {
        let data = decode::<WireClaims>(token, &self.decoding, &self.validation)
            .map_err(|error| CredentialTokenError::invalid(error.to_string()))?;
        let wire = data.claims;
        Ok(TokenClaims {
            subject: UserId::from_uuid(wire.sub),
            purpose: wire.purpose,
            issued_at: timestamp(wire.iat, "iat")?,
            expires_at: timestamp(wire.exp, "exp")?,
        })
    }
}
