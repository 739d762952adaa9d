//! Builders wiring adapters into the HTTP and WebSocket states.
//!
//! The same generic wiring serves both storage back ends: PostgreSQL when a
//! database URL is configured, the in-process store otherwise.

use std::sync::Arc;

use color_eyre::eyre::{Result, WrapErr};
use mockable::{Clock, DefaultClock};
use tracing::{info, warn};

use synclist::domain::ports::{
    CredentialTokens, ListRepository, MailTransport, OneTimeCodeRepository, UserRepository,
};
use synclist::domain::{AccountManager, ListService, PasswordRecovery, RecoveryPorts};
use synclist::inbound::http::session_config::BuildMode;
use synclist::inbound::http::state::HttpState;
use synclist::inbound::ws::state::{AllowedOrigins, WsState};
use synclist::outbound::fanout::TopicRegistry;
use synclist::outbound::mail::{HttpMailTransport, LogMailTransport};
use synclist::outbound::memory::InMemoryStore;
use synclist::outbound::persistence::{
    DbPool, DieselListRepository, DieselOneTimeCodeRepository, DieselUserRepository,
    run_migrations,
};
use synclist::outbound::security::{Argon2PasswordHasher, JwtCredentialTokens};

use super::config::AppSettings;

/// Adapter states shared by every worker.
#[derive(Clone)]
pub struct AppStates {
    pub http: HttpState,
    pub ws: WsState,
}

/// Ports that do not depend on the storage back end.
struct SharedPorts {
    topics: Arc<TopicRegistry>,
    tokens: Arc<dyn CredentialTokens>,
    mail: Arc<dyn MailTransport>,
    clock: Arc<dyn Clock>,
    origins: AllowedOrigins,
    outbox_capacity: usize,
}

/// Build adapter states from settings, running migrations first when a
/// database is configured.
pub async fn build_states(settings: &AppSettings, mode: BuildMode) -> Result<AppStates> {
    let secret = settings.reset_token_secret(mode)?;
    let shared = SharedPorts {
        topics: Arc::new(TopicRegistry::new()),
        tokens: Arc::new(JwtCredentialTokens::new(&secret)),
        mail: build_mail(settings)?,
        clock: Arc::new(DefaultClock),
        origins: settings.allowed_origins(mode)?,
        outbox_capacity: settings.outbox_capacity(),
    };

    match settings.database_url.as_deref() {
        Some(url) => {
            run_migrations(url)
                .await
                .wrap_err("failed to apply database migrations")?;
            let pool = DbPool::new(settings.pool_config(url))
                .await
                .wrap_err("failed to build database pool")?;
            info!("using PostgreSQL storage");
            Ok(wire(
                Arc::new(DieselListRepository::new(pool.clone())),
                Arc::new(DieselUserRepository::new(pool.clone())),
                Arc::new(DieselOneTimeCodeRepository::new(pool)),
                shared,
            ))
        }
        None => {
            warn!("database_url not set; state is held in memory and lost on restart");
            let store = Arc::new(InMemoryStore::new());
            Ok(wire(store.clone(), store.clone(), store, shared))
        }
    }
}

fn build_mail(settings: &AppSettings) -> Result<Arc<dyn MailTransport>> {
    match settings.mail()? {
        Some(mail) => {
            let transport =
                HttpMailTransport::new(mail.endpoint, mail.api_key.as_str(), mail.sender)
                    .wrap_err("failed to build mail client")?;
            Ok(Arc::new(transport))
        }
        None => {
            warn!("mail_endpoint not set; recovery codes are written to the log (dev only)");
            Ok(Arc::new(LogMailTransport))
        }
    }
}

fn wire<L, U, C>(lists: Arc<L>, users: Arc<U>, codes: Arc<C>, shared: SharedPorts) -> AppStates
where
    L: ListRepository + 'static,
    U: UserRepository + 'static,
    C: OneTimeCodeRepository + 'static,
{
    let SharedPorts {
        topics,
        tokens,
        mail,
        clock,
        origins,
        outbox_capacity,
    } = shared;
    let hasher = Arc::new(Argon2PasswordHasher::new());

    let list_service = Arc::new(ListService::new(
        lists,
        users.clone(),
        topics.clone(),
        clock.clone(),
    ));
    let recovery = PasswordRecovery::new(RecoveryPorts {
        users: users.clone(),
        codes,
        hasher: hasher.clone(),
        tokens,
        mail,
        clock,
    });
    let http = HttpState::new(
        Arc::new(AccountManager::new(users, hasher)),
        Arc::new(recovery),
        list_service.clone(),
        list_service.clone(),
    );
    let ws = WsState::new(list_service, topics, origins, outbox_capacity);
    AppStates { http, ws }
}
