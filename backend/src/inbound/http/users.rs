//! Current-user endpoints.
//!
//! ```text
//! GET /api/v1/users/me
//! PUT /api/v1/users/me/avatar {"avatarUrl":"https://cdn.example.com/ada.png"}
//! ```

use actix_web::{get, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{AvatarUrl, Error, UserProfile};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::avatar_error;

/// Request body for `PUT /api/v1/users/me/avatar`.
///
/// `null` clears the stored avatar.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvatarRequest {
    #[schema(example = "https://cdn.example.com/ada.png")]
    pub avatar_url: Option<String>,
}

/// Return the authenticated user's profile.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Current user", body = UserProfile),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Account no longer exists", body = Error)
    ),
    tags = ["users"],
    operation_id = "currentUser"
)]
#[get("/users/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<UserProfile>> {
    let user_id = session.require_user_id()?;
    let profile = state.accounts.profile(user_id).await?;
    Ok(web::Json(profile))
}

/// Store a reference to an externally hosted avatar image.
#[utoipa::path(
    put,
    path = "/api/v1/users/me/avatar",
    request_body = AvatarRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserProfile),
        (status = 400, description = "Invalid avatar URL", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["users"],
    operation_id = "updateAvatar"
)]
#[put("/users/me/avatar")]
pub async fn update_avatar(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<AvatarRequest>,
) -> ApiResult<web::Json<UserProfile>> {
    let user_id = session.require_user_id()?;
    let avatar = payload
        .into_inner()
        .avatar_url
        .map(AvatarUrl::new)
        .transpose()
        .map_err(avatar_error)?;
    let profile = state.accounts.update_avatar(user_id, avatar).await?;
    Ok(web::Json(profile))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::test_utils::{api_app, signed_in};
    use crate::test_support::TestBackend;
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use rstest::rstest;
    use serde_json::{Value, json};

    #[actix_web::test]
    async fn me_returns_camel_case_profile() {
        let backend = TestBackend::new();
        let app = actix_test::init_service(api_app(&backend)).await;
        let (profile, cookie) = signed_in(&app, "ada").await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/users/me")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let value: Value = actix_test::read_body_json(response).await;
        assert_eq!(value["id"], profile.id.to_string());
        assert_eq!(value["email"], "ada@example.com");
        assert!(value.get("avatarUrl").is_some());
        assert!(value.get("avatar_url").is_none());
    }

    #[actix_web::test]
    async fn me_requires_a_session() {
        let backend = TestBackend::new();
        let app = actix_test::init_service(api_app(&backend)).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/users/me")
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[rstest]
    #[case(json!({"avatarUrl": "https://cdn.example.com/ada.png"}), StatusCode::OK)]
    #[case(json!({"avatarUrl": null}), StatusCode::OK)]
    #[case(json!({"avatarUrl": "ftp://cdn.example.com/ada.png"}), StatusCode::BAD_REQUEST)]
    #[actix_web::test]
    async fn avatar_updates_validate_the_url(#[case] body: Value, #[case] expected: StatusCode) {
        let backend = TestBackend::new();
        let app = actix_test::init_service(api_app(&backend)).await;
        let (_, cookie) = signed_in(&app, "ada").await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::put()
                .uri("/api/v1/users/me/avatar")
                .cookie(cookie)
                .set_json(body.clone())
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), expected);
        let value: Value = actix_test::read_body_json(response).await;
        if expected == StatusCode::OK {
            assert_eq!(value["avatarUrl"], body["avatarUrl"]);
        } else {
            assert_eq!(value["details"]["field"], "avatarUrl");
        }
    }
}
