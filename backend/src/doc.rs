//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every REST handler under `/api/v1`, the health probes
//! and the request, response and error schemas, plus the session cookie
//! security scheme. Swagger UI serves it in debug builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{
    ClaimantSummary, Error, ErrorCode, ItemView, ListDetails, ListSummary, MemberSummary,
    UserProfile,
};
use crate::inbound::http::auth::{LoginRequest, RegisterRequest};
use crate::inbound::http::lists::NameRequest;
use crate::inbound::http::password_reset::{
    CodeRequest, ResetRequest, VerifyRequest, VerifyResponse,
};
use crate::inbound::http::users::AvatarRequest;

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/auth/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "synclist API",
        description = "Shared lists with realtime claims. Live updates are served over the /ws WebSocket."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::auth::register,
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::logout,
        crate::inbound::http::password_reset::request_code,
        crate::inbound::http::password_reset::verify_code,
        crate::inbound::http::password_reset::reset_password,
        crate::inbound::http::users::current_user,
        crate::inbound::http::users::update_avatar,
        crate::inbound::http::lists::my_lists,
        crate::inbound::http::lists::create_list,
        crate::inbound::http::lists::list_details,
        crate::inbound::http::lists::delete_list,
        crate::inbound::http::lists::join_list,
        crate::inbound::http::lists::add_item,
        crate::inbound::http::items::remove_item,
        crate::inbound::http::items::toggle_claim,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        UserProfile,
        MemberSummary,
        ClaimantSummary,
        ListSummary,
        ListDetails,
        ItemView,
        RegisterRequest,
        LoginRequest,
        AvatarRequest,
        NameRequest,
        CodeRequest,
        VerifyRequest,
        VerifyResponse,
        ResetRequest,
    )),
    tags(
        (name = "auth", description = "Registration, sessions and password recovery"),
        (name = "users", description = "The signed-in user's profile"),
        (name = "lists", description = "Shared lists and membership"),
        (name = "items", description = "List items and claims"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying the registered paths and schema field names.

    use super::*;
    use crate::test_support::openapi::{get_property, unwrap_object_schema};
    use rstest::rstest;

    fn schema(name: &str) -> utoipa::openapi::RefOr<utoipa::openapi::schema::Schema> {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        components
            .schemas
            .get(name)
            .cloned()
            .unwrap_or_else(|| panic!("schema '{name}' registered"))
    }

    #[rstest]
    #[case("/api/v1/auth/register")]
    #[case("/api/v1/auth/password-reset/verify")]
    #[case("/api/v1/lists/{id}")]
    #[case("/api/v1/lists/{id}/join")]
    #[case("/api/v1/items/{id}/claim")]
    #[case("/health/ready")]
    fn registers_paths(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing path {path}");
    }

    #[rstest]
    #[case("Error", "traceId")]
    #[case("UserProfile", "avatarUrl")]
    #[case("ItemView", "claimedBy")]
    #[case("ListSummary", "memberCount")]
    #[case("VerifyResponse", "resetToken")]
    fn schemas_use_wire_field_names(#[case] name: &str, #[case] field: &str) {
        let schema = schema(name);
        let object = unwrap_object_schema(&schema, name);
        let _ = get_property(object, field);
    }

    #[test]
    fn declares_session_cookie_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("SessionCookie"));
    }
}
