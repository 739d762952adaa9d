//! WebSocket inbound adapter carrying list topic events to browsers.
//!
//! Responsibilities:
//! - validate upgrade requests (origin allow-list, authenticated session)
//! - spawn the per-connection session loop
//! - keep WebSocket-specific concerns at the edge of the system

use actix_web::web::{self, Payload};
use actix_web::{
    HttpRequest, HttpResponse, get,
    http::header::{HeaderValue, ORIGIN},
};
use tracing::{error, warn};
use url::Url;

use crate::inbound::http::session::SessionContext;

mod session;

pub mod messages;
pub mod state;

use state::{AllowedOrigins, WsState};

/// Handle WebSocket upgrade for the `/ws` endpoint.
#[get("/ws")]
pub async fn ws_entry(
    state: web::Data<WsState>,
    identity: SessionContext,
    req: HttpRequest,
    body: Payload,
) -> actix_web::Result<HttpResponse> {
    let mut origin_iter = req.headers().get_all(ORIGIN);
    let origin_header = origin_iter.next().ok_or_else(|| {
        warn!("missing Origin header on WebSocket upgrade");
        actix_web::error::ErrorForbidden("Origin not allowed")
    })?;
    if origin_iter.next().is_some() {
        warn!("multiple Origin headers on WebSocket upgrade");
        return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
    }
    validate_origin(&state.origins, origin_header)?;

    let user = identity.require_user_id()?;

    let (response, ws_session, stream) = actix_ws::handle(&req, body).map_err(|error| {
        error!(error = %error, "WebSocket upgrade failed");
        error
    })?;

    let deps = session::SessionDeps {
        user,
        lists: state.lists.clone(),
        topics: state.topics.clone(),
        outbox_capacity: state.outbox_capacity,
    };
    actix_web::rt::spawn(session::handle_ws_session(deps, ws_session, stream));
    Ok(response)
}

fn validate_origin(origins: &AllowedOrigins, origin_header: &HeaderValue) -> actix_web::Result<()> {
    let origin_value = match origin_header.to_str() {
        Ok(value) => value,
        Err(error) => {
            warn!(error = %error, "failed to parse Origin header as string");
            return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
        }
    };

    let origin = Url::parse(origin_value).map_err(|error| {
        warn!(error = %error, "failed to parse Origin header as URL");
        actix_web::error::ErrorBadRequest("Invalid Origin header")
    })?;

    if origins.is_allowed(&origin) {
        Ok(())
    } else {
        warn!(
            origin = origin_value,
            "rejected WS upgrade due to disallowed Origin"
        );
        Err(actix_web::error::ErrorForbidden("Origin not allowed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use rstest::{fixture, rstest};

    #[fixture]
    fn origins() -> AllowedOrigins {
        AllowedOrigins::parse(["http://localhost:3000", "https://lists.example.com"])
            .expect("origins parse")
    }

    fn status_of(result: actix_web::Result<()>) -> StatusCode {
        result
            .expect_err("origin should be rejected")
            .as_response_error()
            .status_code()
    }

    #[rstest]
    #[case("http://localhost:3000")]
    #[case("https://lists.example.com")]
    fn accepts_configured_origins(origins: AllowedOrigins, #[case] origin: &str) {
        let header = HeaderValue::from_str(origin).expect("valid header value");
        assert!(validate_origin(&origins, &header).is_ok());
    }

    #[rstest]
    #[case("http://localhost")]
    #[case("https://example.com")]
    #[case("wss://lists.example.com")]
    fn rejects_disallowed_origins(origins: AllowedOrigins, #[case] origin: &str) {
        let header = HeaderValue::from_str(origin).expect("valid header value");
        assert_eq!(
            status_of(validate_origin(&origins, &header)),
            StatusCode::FORBIDDEN
        );
    }

    #[rstest]
    fn rejects_non_utf8_origin_header(origins: AllowedOrigins) {
        let header = HeaderValue::from_bytes(&[0x80]).expect("opaque header value");
        assert_eq!(
            status_of(validate_origin(&origins, &header)),
            StatusCode::BAD_REQUEST
        );
    }

    #[rstest]
    fn rejects_unparsable_origin_header(origins: AllowedOrigins) {
        let header = HeaderValue::from_static("not a url");
        assert_eq!(
            status_of(validate_origin(&origins, &header)),
            StatusCode::BAD_REQUEST
        );
    }
}
