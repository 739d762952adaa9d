//! Session cookie settings validated against the build mode.
//!
//! Debug builds tolerate missing toggles and fall back to an ephemeral key
//! with a warning. Release builds require an explicit `Secure` decision and a
//! key file of at least 64 bytes.

use std::path::{Path, PathBuf};

use actix_web::cookie::{Key, SameSite};
use sha2::{Digest, Sha256};
use tracing::warn;
use zeroize::Zeroize;

const SESSION_KEY_MIN_LEN: usize = 64;
const FINGERPRINT_BYTES: usize = 8;
const SAMESITE_EXPECTED: &str = "Strict|Lax|None";

/// Build mode for session configuration validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    Debug,
    Release,
}

impl BuildMode {
    /// Determine the build mode from `cfg!(debug_assertions)`.
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Raw session toggles as supplied by configuration.
#[derive(Debug, Clone, Default)]
pub struct SessionToggles {
    pub key_file: Option<PathBuf>,
    pub cookie_secure: Option<bool>,
    pub same_site: Option<String>,
    pub allow_ephemeral: bool,
}

/// Validated session settings.
#[derive(Clone)]
pub struct SessionSettings {
    pub key: Key,
    pub cookie_secure: bool,
    pub same_site: SameSite,
}

/// Errors raised while validating session configuration.
#[derive(thiserror::Error, Debug)]
pub enum SessionConfigError {
    #[error("missing required session setting: {name}")]
    Missing { name: &'static str },
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("failed to read session key at {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
    #[error("SameSite=None requires secure session cookies")]
    InsecureSameSiteNone,
    #[error("ephemeral session keys are not allowed in release builds")]
    EphemeralNotAllowed,
}

/// Validate session toggles for the given build mode.
///
/// # Examples
/// ```
/// use synclist::inbound::http::session_config::{BuildMode, SessionToggles, session_settings};
///
/// let settings = session_settings(&SessionToggles::default(), BuildMode::Debug)
///     .expect("debug builds fall back to defaults");
/// assert!(settings.cookie_secure);
/// ```
pub fn session_settings(
    toggles: &SessionToggles,
    mode: BuildMode,
) -> Result<SessionSettings, SessionConfigError> {
    if toggles.allow_ephemeral && !mode.is_debug() {
        return Err(SessionConfigError::EphemeralNotAllowed);
    }
    let cookie_secure = match toggles.cookie_secure {
        Some(flag) => flag,
        None if mode.is_debug() => {
            warn!("session cookie_secure not set; defaulting to secure");
            true
        }
        None => {
            return Err(SessionConfigError::Missing {
                name: "cookie_secure",
            });
        }
    };
    let same_site = same_site(toggles.same_site.as_deref(), mode, cookie_secure)?;
    let key = session_key(toggles, mode)?;
    Ok(SessionSettings {
        key,
        cookie_secure,
        same_site,
    })
}

fn same_site(
    raw: Option<&str>,
    mode: BuildMode,
    cookie_secure: bool,
) -> Result<SameSite, SessionConfigError> {
    let default = if mode.is_debug() {
        SameSite::Lax
    } else {
        SameSite::Strict
    };
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.to_ascii_lowercase().as_str() {
        "lax" => Ok(SameSite::Lax),
        "strict" => Ok(SameSite::Strict),
        "none" if cookie_secure => Ok(SameSite::None),
        "none" if mode.is_debug() => {
            warn!("SameSite=None with insecure cookies; browsers may reject the session");
            Ok(SameSite::None)
        }
        "none" => Err(SessionConfigError::InsecureSameSiteNone),
        _ if mode.is_debug() => {
            warn!(value = raw, "invalid same_site; using default");
            Ok(default)
        }
        _ => Err(SessionConfigError::Invalid {
            name: "same_site",
            value: raw.to_owned(),
            expected: SAMESITE_EXPECTED,
        }),
    }
}

fn session_key(toggles: &SessionToggles, mode: BuildMode) -> Result<Key, SessionConfigError> {
    let Some(path) = toggles.key_file.as_deref() else {
        if mode.is_debug() || toggles.allow_ephemeral {
            warn!("no session key file configured; using temporary key (dev only)");
            return Ok(Key::generate());
        }
        return Err(SessionConfigError::Missing { name: "key_file" });
    };
    match std::fs::read(path) {
        Ok(bytes) => key_from_bytes(path, bytes, mode),
        Err(error) if mode.is_debug() || toggles.allow_ephemeral => {
            warn!(path = %path.display(), %error, "using temporary session key (dev only)");
            Ok(Key::generate())
        }
        Err(source) => Err(SessionConfigError::KeyRead {
            path: path.to_owned(),
            source,
        }),
    }
}

fn key_from_bytes(path: &Path, mut bytes: Vec<u8>, mode: BuildMode) -> Result<Key, SessionConfigError> {
    let length = bytes.len();
    if length < SESSION_KEY_MIN_LEN && (mode == BuildMode::Release || length == 0) {
        bytes.zeroize();
        return Err(SessionConfigError::KeyTooShort {
            path: path.to_owned(),
            length,
            min_len: SESSION_KEY_MIN_LEN,
        });
    }
    let key = Key::derive_from(&bytes);
    bytes.zeroize();
    Ok(key)
}

/// Truncated SHA-256 of the signing key, safe to log for rotation checks.
#[must_use]
pub fn key_fingerprint(key: &Key) -> String {
    let digest = Sha256::digest(key.signing());
    hex::encode(&digest[..FINGERPRINT_BYTES])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use uuid::Uuid;

    struct TempKeyFile(PathBuf);

    impl TempKeyFile {
        fn new(len: usize) -> Self {
            let path = std::env::temp_dir().join(format!("synclist-session-{}", Uuid::new_v4()));
            std::fs::write(&path, vec![b'k'; len]).expect("write key file");
            Self(path)
        }
    }

    impl Drop for TempKeyFile {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    fn release_toggles(key: &TempKeyFile) -> SessionToggles {
        SessionToggles {
            key_file: Some(key.0.clone()),
            cookie_secure: Some(true),
            same_site: Some("Strict".into()),
            allow_ephemeral: false,
        }
    }

    #[rstest]
    fn release_accepts_complete_settings() {
        let key = TempKeyFile::new(64);
        let settings =
            session_settings(&release_toggles(&key), BuildMode::Release).expect("valid settings");
        assert!(settings.cookie_secure);
        assert_eq!(settings.same_site, SameSite::Strict);
        assert_eq!(
            key_fingerprint(&settings.key),
            key_fingerprint(&Key::derive_from(&[b'k'; 64]))
        );
    }

    #[rstest]
    fn release_rejects_short_keys() {
        let key = TempKeyFile::new(16);
        let err = session_settings(&release_toggles(&key), BuildMode::Release)
            .err()
            .expect("short key rejected");
        assert!(matches!(err, SessionConfigError::KeyTooShort { length: 16, .. }));
    }

    #[rstest]
    fn release_requires_cookie_secure_decision() {
        let key = TempKeyFile::new(64);
        let toggles = SessionToggles {
            cookie_secure: None,
            ..release_toggles(&key)
        };
        let err = session_settings(&toggles, BuildMode::Release)
            .err()
            .expect("missing toggle rejected");
        assert!(matches!(err, SessionConfigError::Missing { name: "cookie_secure" }));
    }

    #[rstest]
    fn release_rejects_insecure_same_site_none() {
        let key = TempKeyFile::new(64);
        let toggles = SessionToggles {
            cookie_secure: Some(false),
            same_site: Some("None".into()),
            ..release_toggles(&key)
        };
        let err = session_settings(&toggles, BuildMode::Release)
            .err()
            .expect("insecure None rejected");
        assert!(matches!(err, SessionConfigError::InsecureSameSiteNone));
    }

    #[rstest]
    fn release_rejects_ephemeral_keys() {
        let key = TempKeyFile::new(64);
        let toggles = SessionToggles {
            allow_ephemeral: true,
            ..release_toggles(&key)
        };
        let err = session_settings(&toggles, BuildMode::Release)
            .err()
            .expect("ephemeral rejected");
        assert!(matches!(err, SessionConfigError::EphemeralNotAllowed));
    }

    #[rstest]
    #[case(Some("bogus"), SameSite::Lax)]
    #[case(None, SameSite::Lax)]
    #[case(Some("strict"), SameSite::Strict)]
    fn debug_falls_back_for_same_site(#[case] raw: Option<&str>, #[case] expected: SameSite) {
        let toggles = SessionToggles {
            same_site: raw.map(str::to_owned),
            ..SessionToggles::default()
        };
        let settings = session_settings(&toggles, BuildMode::Debug).expect("debug tolerates");
        assert_eq!(settings.same_site, expected);
    }

    #[rstest]
    fn fingerprint_is_short_lowercase_hex() {
        let fp = key_fingerprint(&Key::generate());
        assert_eq!(fp.len(), FINGERPRINT_BYTES * 2);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
