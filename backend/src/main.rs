//! synclist entry-point: loads settings, wires adapters and serves HTTP,
//! WebSocket and OpenAPI endpoints.

mod server;

use actix_web::web;
use color_eyre::eyre::{Result, WrapErr};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use server::{AppSettings, ServerConfig, build_states, create_server};
use synclist::inbound::http::health::HealthState;
use synclist::inbound::http::session_config::{BuildMode, key_fingerprint, session_settings};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load().wrap_err("failed to load settings")?;
    let mode = BuildMode::from_debug_assertions();
    let session = session_settings(&settings.session_toggles(), mode)
        .wrap_err("invalid session configuration")?;
    info!(
        fingerprint = %key_fingerprint(&session.key),
        "session signing key loaded"
    );

    let bind_addr = settings.bind_addr()?;
    let states = build_states(&settings, mode).await?;
    let health_state = web::Data::new(HealthState::new());
    let server = create_server(
        health_state,
        ServerConfig::new(session, bind_addr, states),
    )?;
    info!(%bind_addr, "synclist listening");
    server.await?;
    Ok(())
}
