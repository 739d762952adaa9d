//! Item endpoints addressed by item id.
//!
//! ```text
//! DELETE /api/v1/items/{id}
//! PUT    /api/v1/items/{id}/claim
//! ```

use actix_web::{HttpResponse, delete, put, web};

use crate::domain::{Error, ItemView};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::parse_item_id;

/// Remove an item from its list.
#[utoipa::path(
    delete,
    path = "/api/v1/items/{id}",
    params(("id" = String, Path, description = "Item identifier")),
    responses(
        (status = 204, description = "Item removed"),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Not a member", body = Error),
        (status = 404, description = "Item not found", body = Error)
    ),
    tags = ["items"],
    operation_id = "removeItem"
)]
#[delete("/items/{id}")]
pub async fn remove_item(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let item_id = parse_item_id(&path)?;
    state.lists.remove_item(item_id, user_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Claim an unclaimed item, or release the caller's own claim.
#[utoipa::path(
    put,
    path = "/api/v1/items/{id}/claim",
    params(("id" = String, Path, description = "Item identifier")),
    responses(
        (status = 200, description = "Item after the toggle", body = ItemView),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Not a member", body = Error),
        (status = 404, description = "Item not found", body = Error),
        (status = 409, description = "Claimed by another member", body = Error)
    ),
    tags = ["items"],
    operation_id = "toggleClaim"
)]
#[put("/items/{id}/claim")]
pub async fn toggle_claim(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<ItemView>> {
    let user_id = session.require_user_id()?;
    let item_id = parse_item_id(&path)?;
    let item = state.lists.toggle_claim(item_id, user_id).await?;
    Ok(web::Json(item))
}
