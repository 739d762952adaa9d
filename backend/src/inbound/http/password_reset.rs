//! Out-of-band password recovery endpoints.
//!
//! ```text
//! POST /api/v1/auth/password-reset/code   {"email":"ada@example.com"}
//! POST /api/v1/auth/password-reset/verify {"email":"ada@example.com","code":"042917"}
//! POST /api/v1/auth/password-reset        {"resetToken":"...","password":"new secret"}
//! ```

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{EmailAddress, Error, NewPassword, OneTimeCode, ResetToken};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{code_error, credential_error};

/// Request body for `POST /api/v1/auth/password-reset/code`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CodeRequest {
    #[schema(example = "ada@example.com")]
    pub email: String,
}

/// Request body for `POST /api/v1/auth/password-reset/verify`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct VerifyRequest {
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "042917")]
    pub code: String,
}

/// Response body carrying the short-lived reset credential.
#[derive(Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub reset_token: String,
}

/// Request body for `POST /api/v1/auth/password-reset`.
#[derive(Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetRequest {
    pub reset_token: String,
    #[schema(example = "new secret")]
    pub password: String,
}

fn parse_email(raw: &str) -> Result<EmailAddress, Error> {
    EmailAddress::new(raw).map_err(|err| credential_error(err.into()))
}

/// Mail a six-digit code to a registered address.
#[utoipa::path(
    post,
    path = "/api/v1/auth/password-reset/code",
    request_body = CodeRequest,
    responses(
        (status = 202, description = "Code sent"),
        (status = 400, description = "Invalid email", body = Error),
        (status = 404, description = "No account for this email", body = Error),
        (status = 503, description = "Mail delivery failed", body = Error)
    ),
    tags = ["auth"],
    operation_id = "requestResetCode",
    security([])
)]
#[post("/auth/password-reset/code")]
pub async fn request_code(
    state: web::Data<HttpState>,
    payload: web::Json<CodeRequest>,
) -> ApiResult<HttpResponse> {
    let email = parse_email(&payload.email)?;
    state.recovery.request_code(&email).await?;
    Ok(HttpResponse::Accepted().finish())
}

/// Exchange a live code for a reset credential. The code is spent.
#[utoipa::path(
    post,
    path = "/api/v1/auth/password-reset/verify",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Code accepted", body = VerifyResponse),
        (status = 400, description = "Malformed, unknown, spent or expired code", body = Error)
    ),
    tags = ["auth"],
    operation_id = "verifyResetCode",
    security([])
)]
#[post("/auth/password-reset/verify")]
pub async fn verify_code(
    state: web::Data<HttpState>,
    payload: web::Json<VerifyRequest>,
) -> ApiResult<web::Json<VerifyResponse>> {
    let email = parse_email(&payload.email)?;
    let code = OneTimeCode::parse(&payload.code).map_err(code_error)?;
    let token = state.recovery.verify_code(&email, &code).await?;
    Ok(web::Json(VerifyResponse {
        reset_token: token.expose().to_owned(),
    }))
}

/// Replace the password of the account bound to a reset credential.
#[utoipa::path(
    post,
    path = "/api/v1/auth/password-reset",
    request_body = ResetRequest,
    responses(
        (status = 204, description = "Password replaced"),
        (status = 400, description = "Invalid password or expired credential", body = Error)
    ),
    tags = ["auth"],
    operation_id = "resetPassword",
    security([])
)]
#[post("/auth/password-reset")]
pub async fn reset_password(
    state: web::Data<HttpState>,
    payload: web::Json<ResetRequest>,
) -> ApiResult<HttpResponse> {
    let ResetRequest {
        reset_token,
        password,
    } = payload.into_inner();
    let password = NewPassword::new(&password).map_err(credential_error)?;
    state
        .recovery
        .reset_password(&ResetToken::new(reset_token), password)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::test_utils::{ApiService, api_app, login_cookie, register_user};
    use crate::test_support::TestBackend;
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use serde_json::{Value, json};

    async fn post(app: &impl ApiService, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = actix_test::call_service(
            app,
            actix_test::TestRequest::post()
                .uri(uri)
                .set_json(body)
                .to_request(),
        )
        .await;
        let status = response.status();
        let bytes = actix_test::read_body(response).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, value)
    }

    #[actix_web::test]
    async fn full_recovery_replaces_the_password() {
        let backend = TestBackend::new();
        let app = actix_test::init_service(api_app(&backend)).await;
        register_user(&app, "ada@example.com", "ada", "old password").await;

        let (status, _) = post(
            &app,
            "/api/v1/auth/password-reset/code",
            json!({"email": "ada@example.com"}),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        let code = backend.mail.last_code().expect("code mailed");

        let (status, verified) = post(
            &app,
            "/api/v1/auth/password-reset/verify",
            json!({"email": "ada@example.com", "code": code}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let token = verified["resetToken"].as_str().expect("token").to_owned();

        let (status, _) = post(
            &app,
            "/api/v1/auth/password-reset",
            json!({"resetToken": token, "password": "new password"}),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        login_cookie(&app, "ada@example.com", "new password").await;
        let (status, _) = post(
            &app,
            "/api/v1/auth/login",
            json!({"email": "ada@example.com", "password": "old password"}),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn spent_codes_are_invalid_or_expired() {
        let backend = TestBackend::new();
        let app = actix_test::init_service(api_app(&backend)).await;
        register_user(&app, "ada@example.com", "ada", "old password").await;
        post(
            &app,
            "/api/v1/auth/password-reset/code",
            json!({"email": "ada@example.com"}),
        )
        .await;
        let code = backend.mail.last_code().expect("code mailed");
        let body = json!({"email": "ada@example.com", "code": code});

        let (first, _) = post(&app, "/api/v1/auth/password-reset/verify", body.clone()).await;
        let (second, error) = post(&app, "/api/v1/auth/password-reset/verify", body).await;
        assert_eq!(first, StatusCode::OK);
        assert_eq!(second, StatusCode::BAD_REQUEST);
        assert_eq!(error["code"], "invalid_or_expired");
    }

    #[actix_web::test]
    async fn unknown_email_is_not_found() {
        let backend = TestBackend::new();
        let app = actix_test::init_service(api_app(&backend)).await;
        let (status, error) = post(
            &app,
            "/api/v1/auth/password-reset/code",
            json!({"email": "ghost@example.com"}),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error["code"], "not_found");
        assert!(backend.mail.sent().is_empty());
    }

    #[actix_web::test]
    async fn malformed_code_is_a_validation_error() {
        let backend = TestBackend::new();
        let app = actix_test::init_service(api_app(&backend)).await;
        let (status, error) = post(
            &app,
            "/api/v1/auth/password-reset/verify",
            json!({"email": "ada@example.com", "code": "12ab"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["code"], "invalid_request");
        assert_eq!(error["details"]["field"], "code");
    }

    #[actix_web::test]
    async fn forged_token_is_rejected() {
        let backend = TestBackend::new();
        let app = actix_test::init_service(api_app(&backend)).await;
        let (status, error) = post(
            &app,
            "/api/v1/auth/password-reset",
            json!({"resetToken": "not.a.token", "password": "new password"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["code"], "invalid_or_expired");
    }
}
