//! Application settings loaded via OrthoConfig.
//!
//! Values come from CLI flags, `SYNCLIST_*` environment variables and an
//! optional configuration file. Accessors apply defaults and validate the
//! raw strings so startup fails early with a precise message.

use std::net::SocketAddr;
use std::path::PathBuf;

use ortho_config::OrthoConfig;
use rand::RngCore as _;
use serde::Deserialize;
use tracing::warn;
use url::Url;
use zeroize::Zeroizing;

use synclist::domain::EmailAddress;
use synclist::inbound::http::session_config::{BuildMode, SessionToggles};
use synclist::inbound::ws::state::AllowedOrigins;
use synclist::outbound::persistence::PoolConfig;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_DEV_ORIGIN: &str = "http://localhost:3000";
const DEFAULT_OUTBOX_CAPACITY: usize = 64;
const RESET_SECRET_MIN_LEN: usize = 32;

/// Settings that cannot be turned into a running server.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address '{value}': {message}")]
    BindAddr { value: String, message: String },
    #[error("invalid allowed origin in '{value}': {source}")]
    Origin {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("allowed_origins must name at least one origin in release builds")]
    NoOrigins,
    #[error("reset_token_secret must be at least {RESET_SECRET_MIN_LEN} bytes")]
    WeakResetSecret,
    #[error("reset_token_secret is required in release builds")]
    MissingResetSecret,
    #[error("invalid mail setting {name}: {message}")]
    Mail { name: &'static str, message: String },
}

/// Runtime settings for the synclist server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SYNCLIST")]
pub struct AppSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL; the in-memory store is used when absent.
    pub database_url: Option<String>,
    /// Upper bound on pooled database connections.
    pub database_pool_size: Option<u32>,
    /// File holding the session signing key material.
    pub session_key_file: Option<PathBuf>,
    /// Whether session cookies carry the `Secure` attribute.
    pub session_cookie_secure: Option<bool>,
    /// `SameSite` policy for the session cookie.
    pub session_same_site: Option<String>,
    /// Permit a generated session key when the key file is unreadable.
    #[ortho_config(default = false)]
    pub session_allow_ephemeral: bool,
    /// Origins allowed to open `/ws`; comma-separated in the environment.
    pub allowed_origins: Option<Vec<String>>,
    /// HMAC secret for reset credentials.
    pub reset_token_secret: Option<String>,
    /// HTTP mail API endpoint; mail is only logged when absent.
    pub mail_endpoint: Option<String>,
    pub mail_api_key: Option<String>,
    pub mail_sender: Option<String>,
    /// Events buffered per live connection before new ones are dropped.
    pub outbox_capacity: Option<usize>,
}

/// Resolved HTTP mail transport settings.
pub struct MailSettings {
    pub endpoint: Url,
    pub api_key: Zeroizing<String>,
    pub sender: EmailAddress,
}

impl AppSettings {
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|error: std::net::AddrParseError| SettingsError::BindAddr {
            value: raw.to_owned(),
            message: error.to_string(),
        })
    }

    pub fn pool_config(&self, database_url: &str) -> PoolConfig {
        let config = PoolConfig::new(database_url);
        match self.database_pool_size {
            Some(size) => config.with_max_size(size),
            None => config,
        }
    }

    pub fn session_toggles(&self) -> SessionToggles {
        SessionToggles {
            key_file: self.session_key_file.clone(),
            cookie_secure: self.session_cookie_secure,
            same_site: self.session_same_site.clone(),
            allow_ephemeral: self.session_allow_ephemeral,
        }
    }

    pub fn allowed_origins(&self, mode: BuildMode) -> Result<AllowedOrigins, SettingsError> {
        let configured: Vec<&str> = self
            .allowed_origins
            .iter()
            .flatten()
            .map(|origin| origin.trim())
            .filter(|origin| !origin.is_empty())
            .collect();
        let origins = if !configured.is_empty() {
            configured
        } else if mode == BuildMode::Debug {
            warn!(origin = DEFAULT_DEV_ORIGIN, "allowed_origins not set; using dev origin");
            vec![DEFAULT_DEV_ORIGIN]
        } else {
            return Err(SettingsError::NoOrigins);
        };
        AllowedOrigins::parse(origins.iter().copied()).map_err(|source| SettingsError::Origin {
            value: origins.join(","),
            source,
        })
    }

    /// Secret for reset credentials; debug builds fall back to a random one.
    pub fn reset_token_secret(&self, mode: BuildMode) -> Result<Zeroizing<Vec<u8>>, SettingsError> {
        match self.reset_token_secret.as_deref() {
            Some(secret) if secret.len() >= RESET_SECRET_MIN_LEN => {
                Ok(Zeroizing::new(secret.as_bytes().to_vec()))
            }
            Some(_) => Err(SettingsError::WeakResetSecret),
            None if mode == BuildMode::Debug => {
                warn!("reset_token_secret not set; using a random secret (dev only)");
                let mut secret = vec![0_u8; RESET_SECRET_MIN_LEN];
                rand::thread_rng().fill_bytes(&mut secret);
                Ok(Zeroizing::new(secret))
            }
            None => Err(SettingsError::MissingResetSecret),
        }
    }

    /// HTTP mail settings, or `None` when mail should only be logged.
    pub fn mail(&self) -> Result<Option<MailSettings>, SettingsError> {
        let Some(endpoint) = self.mail_endpoint.as_deref() else {
            return Ok(None);
        };
        let endpoint = Url::parse(endpoint).map_err(|error| SettingsError::Mail {
            name: "mail_endpoint",
            message: error.to_string(),
        })?;
        let api_key = self.mail_api_key.clone().ok_or_else(|| missing_mail("mail_api_key"))?;
        let sender = self.mail_sender.as_deref().ok_or_else(|| missing_mail("mail_sender"))?;
        let sender = EmailAddress::new(sender).map_err(|error| SettingsError::Mail {
            name: "mail_sender",
            message: error.to_string(),
        })?;
        Ok(Some(MailSettings {
            endpoint,
            api_key: Zeroizing::new(api_key),
            sender,
        }))
    }

    pub fn outbox_capacity(&self) -> usize {
        self.outbox_capacity
            .filter(|capacity| *capacity > 0)
            .unwrap_or(DEFAULT_OUTBOX_CAPACITY)
    }
}

fn missing_mail(name: &'static str) -> SettingsError {
    SettingsError::Mail {
        name,
        message: "required with mail_endpoint".to_owned(),
    }
}
