//! Test helpers for inbound HTTP components.

use actix_http::Request;
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, test as actix_test, web};
use serde_json::json;

use crate::domain::UserProfile;
use crate::middleware::Trace;
use crate::test_support::TestBackend;

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Application exposing the full `/api/v1` surface over `backend`.
pub fn api_app(
    backend: &TestBackend,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    > + use<>,
> {
    App::new()
        .app_data(web::Data::new(backend.http.clone()))
        .wrap(test_session_middleware())
        .wrap(Trace)
        .service(web::scope("/api/v1").configure(super::configure_api))
}

/// Initialised service produced by [`api_app`].
pub trait ApiService:
    Service<Request, Response = ServiceResponse, Error = actix_web::Error>
{
}

impl<S> ApiService for S where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>
{
}

pub async fn register_user(
    app: &impl ApiService,
    email: &str,
    username: &str,
    password: &str,
) -> UserProfile {
    let response = actix_test::call_service(
        app,
        actix_test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(json!({"email": email, "username": username, "password": password}))
            .to_request(),
    )
    .await;
    assert!(
        response.status().is_success(),
        "registration failed: {}",
        response.status()
    );
    actix_test::read_body_json(response).await
}

pub async fn login_cookie(app: &impl ApiService, email: &str, password: &str) -> Cookie<'static> {
    let response = actix_test::call_service(
        app,
        actix_test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(json!({"email": email, "password": password}))
            .to_request(),
    )
    .await;
    assert!(
        response.status().is_success(),
        "login failed: {}",
        response.status()
    );
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
        .expect("session cookie")
}

/// Register `username` with a fixed password and return its profile and
/// session cookie.
pub async fn signed_in(app: &impl ApiService, username: &str) -> (UserProfile, Cookie<'static>) {
    let email = format!("{username}@example.com");
    let profile = register_user(app, &email, username, "correct horse").await;
    let cookie = login_cookie(app, &email, "correct horse").await;
    (profile, cookie)
}
