//! Account entry points: registration, login and logout.
//!
//! ```text
//! POST /api/v1/auth/register {"email":"ada@example.com","username":"ada","password":"correct horse"}
//! POST /api/v1/auth/login    {"email":"ada@example.com","password":"correct horse"}
//! POST /api/v1/auth/logout
//! ```

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::domain::{Error, LoginCredentials, Registration, UserProfile};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::credential_error;

/// Request body for `POST /api/v1/auth/register`.
#[derive(Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "ada")]
    pub username: String,
    #[schema(example = "correct horse")]
    pub password: String,
}

/// Request body for `POST /api/v1/auth/login`.
#[derive(Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "correct horse")]
    pub password: String,
}

/// Create an account. Does not log the new user in.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserProfile),
        (status = 400, description = "Invalid request", body = Error),
        (status = 409, description = "Email already registered", body = Error),
        (status = 503, description = "Storage unavailable", body = Error)
    ),
    tags = ["auth"],
    operation_id = "register",
    security([])
)]
#[post("/auth/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let RegisterRequest {
        email,
        username,
        password,
    } = payload.into_inner();
    let registration =
        Registration::try_from_parts(&email, &username, &password).map_err(credential_error)?;
    let profile = state.accounts.register(registration).await?;
    info!(user_id = %profile.id, "account registered");
    Ok(HttpResponse::Created().json(profile))
}

/// Authenticate and establish a cookie session.
///
/// Unknown emails and wrong passwords produce the same `401` response.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = UserProfile,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 503, description = "Storage unavailable", body = Error)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<UserProfile>> {
    let credentials = LoginCredentials::try_from_parts(&payload.email, &payload.password)
        .map_err(credential_error)?;
    let user_id = state.accounts.authenticate(&credentials).await?;
    session.persist_user(&user_id)?;
    let profile = state.accounts.profile(user_id).await?;
    Ok(web::Json(profile))
}

/// End the session. Succeeds whether or not a session existed.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses((status = 204, description = "Session cleared")),
    tags = ["auth"],
    operation_id = "logout"
)]
#[post("/auth/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.clear();
    HttpResponse::NoContent().finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::test_utils::{api_app, login_cookie, register_user};
    use crate::test_support::TestBackend;
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use rstest::rstest;
    use serde_json::{Value, json};

    #[actix_web::test]
    async fn register_returns_profile_without_password() {
        let backend = TestBackend::new();
        let app = actix_test::init_service(api_app(&backend)).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/auth/register")
                .set_json(json!({
                    "email": "Ada@Example.com",
                    "username": "ada",
                    "password": "correct horse"
                }))
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let value: Value = actix_test::read_body_json(response).await;
        assert_eq!(value["email"], "ada@example.com");
        assert_eq!(value["username"], "ada");
        assert!(value.get("password").is_none());
    }

    #[actix_web::test]
    async fn duplicate_registration_conflicts() {
        let backend = TestBackend::new();
        let app = actix_test::init_service(api_app(&backend)).await;
        register_user(&app, "ada@example.com", "ada", "correct horse").await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/auth/register")
                .set_json(json!({
                    "email": "ada@example.com",
                    "username": "other",
                    "password": "another pass"
                }))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[rstest]
    #[case(json!({"email": "nope", "username": "ada", "password": "correct horse"}), "email")]
    #[case(json!({"email": "a@b.io", "username": " ", "password": "correct horse"}), "username")]
    #[case(json!({"email": "a@b.io", "username": "ada", "password": "short"}), "password")]
    #[actix_web::test]
    async fn register_reports_invalid_field(#[case] body: Value, #[case] field: &str) {
        let backend = TestBackend::new();
        let app = actix_test::init_service(api_app(&backend)).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/auth/register")
                .set_json(body)
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let value: Value = actix_test::read_body_json(response).await;
        assert_eq!(value["code"], "invalid_request");
        assert_eq!(value["details"]["field"], field);
    }

    #[rstest]
    #[case("ada@example.com", "wrong password")]
    #[case("nobody@example.com", "correct horse")]
    #[actix_web::test]
    async fn login_failures_are_indistinguishable(#[case] email: &str, #[case] password: &str) {
        let backend = TestBackend::new();
        let app = actix_test::init_service(api_app(&backend)).await;
        register_user(&app, "ada@example.com", "ada", "correct horse").await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/auth/login")
                .set_json(json!({"email": email, "password": password}))
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let value: Value = actix_test::read_body_json(response).await;
        assert_eq!(value["message"], "invalid credentials");
    }

    #[actix_web::test]
    async fn logout_ends_the_session() {
        let backend = TestBackend::new();
        let app = actix_test::init_service(api_app(&backend)).await;
        register_user(&app, "ada@example.com", "ada", "correct horse").await;
        let cookie = login_cookie(&app, "ada@example.com", "correct horse").await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/auth/logout")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let cleared = response
            .response()
            .cookies()
            .find(|c| c.name() == "session")
            .map(|c| c.into_owned())
            .expect("removal cookie");

        let me = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/users/me")
                .cookie(cleared)
                .to_request(),
        )
        .await;
        assert_eq!(me.status(), StatusCode::UNAUTHORIZED);
    }
}
