//! Test utilities for the synclist crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`).
//! Compiled for tests and when the `test-support` feature is enabled.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use argon2::Params;
use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::ports::{MailMessage, MailTransport, MailTransportError};
use crate::domain::{AccountManager, ListService, PasswordRecovery, RecoveryPorts};
use crate::inbound::http::state::HttpState;
use crate::inbound::ws::state::{AllowedOrigins, WsState};
use crate::outbound::fanout::TopicRegistry;
use crate::outbound::memory::InMemoryStore;
use crate::outbound::security::{Argon2PasswordHasher, JwtCredentialTokens};

/// Origin accepted by [`TestBackend`] WebSocket state.
pub const TEST_ORIGIN: &str = "http://localhost:3000";

/// Clock whose current instant is moved explicitly by the test.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, delta: Duration) {
        let delta = match TimeDelta::from_std(delta) {
            Ok(delta) => delta,
            Err(error) => {
                panic!("failed to convert Duration to TimeDelta: {error}; delta={delta:?}",)
            }
        };
        *self.lock_clock() += delta;
    }

    pub fn advance_seconds(&self, seconds: i64) {
        *self.lock_clock() += TimeDelta::seconds(seconds);
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Mail transport that keeps every message it is handed.
///
/// Call [`RecordingMailTransport::fail_with`] to make subsequent sends fail
/// after recording.
#[derive(Default)]
pub struct RecordingMailTransport {
    sent: Mutex<Vec<MailMessage>>,
    failure: Mutex<Option<MailTransportError>>,
}

impl RecordingMailTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_with(&self, error: MailTransportError) {
        *lock(&self.failure) = Some(error);
    }

    pub fn sent(&self) -> Vec<MailMessage> {
        lock(&self.sent).clone()
    }

    /// Six-digit code from the most recent message, if any.
    pub fn last_code(&self) -> Option<String> {
        let sent = lock(&self.sent);
        let body = &sent.last()?.body;
        body.split(|c: char| !c.is_ascii_digit())
            .find(|token| token.len() == crate::domain::CODE_DIGITS)
            .map(str::to_owned)
    }
}

#[async_trait]
impl MailTransport for RecordingMailTransport {
    async fn send(&self, message: &MailMessage) -> Result<(), MailTransportError> {
        lock(&self.sent).push(message.clone());
        match lock(&self.failure).clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(_) => panic!("test support mutex"),
    }
}

/// Fully wired in-memory backend for handler and flow tests.
///
/// Uses cheap Argon2 parameters, a recording mail transport and a clock
/// pinned to a fixed instant that tests advance explicitly.
pub struct TestBackend {
    pub store: Arc<InMemoryStore>,
    pub topics: Arc<TopicRegistry>,
    pub mail: Arc<RecordingMailTransport>,
    pub clock: Arc<MutableClock>,
    pub http: HttpState,
    pub ws: WsState,
}

impl TestBackend {
    pub fn new() -> Self {
        let start = match Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).single() {
            Some(instant) => instant,
            None => panic!("fixed test instant"),
        };
        let store = Arc::new(InMemoryStore::new());
        let topics = Arc::new(TopicRegistry::new());
        let mail = Arc::new(RecordingMailTransport::new());
        let clock = Arc::new(MutableClock::new(start));
        let params = match Params::new(8, 1, 1, None) {
            Ok(params) => params,
            Err(error) => panic!("argon2 test params: {error}"),
        };
        let hasher = Arc::new(Argon2PasswordHasher::with_params(params));

        let lists = Arc::new(ListService::new(
            store.clone(),
            store.clone(),
            topics.clone(),
            clock.clone(),
        ));
        let recovery = PasswordRecovery::new(RecoveryPorts {
            users: store.clone(),
            codes: store.clone(),
            hasher: hasher.clone(),
            tokens: Arc::new(JwtCredentialTokens::new(b"test-reset-secret")),
            mail: mail.clone(),
            clock: clock.clone(),
        });
        let http = HttpState::new(
            Arc::new(AccountManager::new(store.clone(), hasher)),
            Arc::new(recovery),
            lists.clone(),
            lists.clone(),
        );
        let ws = WsState::new(
            lists,
            topics.clone(),
            AllowedOrigins::parse([TEST_ORIGIN]).unwrap_or_else(|error| {
                panic!("test origin must parse: {error}")
            }),
            16,
        );

        Self {
            store,
            topics,
            mail,
            clock,
            http,
            ws,
        }
    }
}

impl Default for TestBackend {
    fn default() -> Self {
        Self::new()
    }
}

pub mod openapi {
    //! OpenAPI schema traversal helpers.
    //!
    //! Resolves utoipa `RefOr<Schema>` wrappers to concrete `Object` schemas
    //! with diagnostic panics on type mismatches.

    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::{Object, Schema};

    /// Extract an `Object` schema, panicking with a diagnostic if not an Object.
    pub fn unwrap_object_schema<'a>(schema: &'a RefOr<Schema>, name: &str) -> &'a Object {
        match schema {
            RefOr::T(Schema::Object(obj)) => obj,
            RefOr::Ref(reference) => {
                panic!(
                    "schema '{name}' is a $ref to '{}'; resolve the reference first",
                    reference.ref_location
                );
            }
            RefOr::T(Schema::Array(_)) => {
                panic!("schema '{name}' is an Array, not an Object");
            }
            _ => panic!("schema '{name}' has unexpected type"),
        }
    }

    /// Get a property from an Object schema by name.
    ///
    /// Panics if the property does not exist.
    pub fn get_property<'a>(obj: &'a Object, field: &str) -> &'a RefOr<Schema> {
        match obj.properties.get(field) {
            Some(property) => property,
            None => panic!("property '{field}' not found"),
        }
    }
}
