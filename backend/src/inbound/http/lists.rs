//! List endpoints: create, browse, join and delete shared lists.
//!
//! ```text
//! GET    /api/v1/lists
//! POST   /api/v1/lists {"name":"Birthday gifts"}
//! GET    /api/v1/lists/{id}
//! DELETE /api/v1/lists/{id}
//! POST   /api/v1/lists/{id}/join
//! POST   /api/v1/lists/{id}/items {"name":"Candles"}
//! ```

use actix_web::{HttpResponse, delete, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Error, ItemName, ItemView, ListDetails, ListName, ListSummary};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{item_name_error, list_name_error, parse_list_id};

/// Request body carrying a display name, shared by list and item creation.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct NameRequest {
    #[schema(example = "Birthday gifts")]
    pub name: String,
}

/// Lists the caller owns or has joined.
#[utoipa::path(
    get,
    path = "/api/v1/lists",
    responses(
        (status = 200, description = "Lists visible to the caller", body = [ListSummary]),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["lists"],
    operation_id = "myLists"
)]
#[get("/lists")]
pub async fn my_lists(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<ListSummary>>> {
    let user_id = session.require_user_id()?;
    let lists = state.lists_query.lists_for_user(user_id).await?;
    Ok(web::Json(lists))
}

/// Create a list owned by the caller.
#[utoipa::path(
    post,
    path = "/api/v1/lists",
    request_body = NameRequest,
    responses(
        (status = 201, description = "List created", body = ListSummary),
        (status = 400, description = "Invalid name", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["lists"],
    operation_id = "createList"
)]
#[post("/lists")]
pub async fn create_list(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<NameRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let name = ListName::new(payload.into_inner().name).map_err(list_name_error)?;
    let summary = state.lists.create_list(user_id, name).await?;
    Ok(HttpResponse::Created().json(summary))
}

/// Members and items of a list the caller belongs to.
#[utoipa::path(
    get,
    path = "/api/v1/lists/{id}",
    params(("id" = String, Path, description = "List identifier")),
    responses(
        (status = 200, description = "List details", body = ListDetails),
        (status = 400, description = "Malformed id", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Not a member", body = Error),
        (status = 404, description = "List not found", body = Error)
    ),
    tags = ["lists"],
    operation_id = "listDetails"
)]
#[get("/lists/{id}")]
pub async fn list_details(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<ListDetails>> {
    let user_id = session.require_user_id()?;
    let list_id = parse_list_id(&path)?;
    let details = state.lists_query.list_details(list_id, user_id).await?;
    Ok(web::Json(details))
}

/// Delete a list and all of its items. Owner only.
#[utoipa::path(
    delete,
    path = "/api/v1/lists/{id}",
    params(("id" = String, Path, description = "List identifier")),
    responses(
        (status = 204, description = "List deleted"),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Not the owner", body = Error),
        (status = 404, description = "List not found", body = Error)
    ),
    tags = ["lists"],
    operation_id = "deleteList"
)]
#[delete("/lists/{id}")]
pub async fn delete_list(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let list_id = parse_list_id(&path)?;
    state.lists.delete_list(list_id, user_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Join a list by id. Joining twice is a no-op.
#[utoipa::path(
    post,
    path = "/api/v1/lists/{id}/join",
    params(("id" = String, Path, description = "List identifier")),
    responses(
        (status = 200, description = "Membership confirmed", body = ListSummary),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "List not found", body = Error)
    ),
    tags = ["lists"],
    operation_id = "joinList"
)]
#[post("/lists/{id}/join")]
pub async fn join_list(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<ListSummary>> {
    let user_id = session.require_user_id()?;
    let list_id = parse_list_id(&path)?;
    let summary = state.lists.join_list(list_id, user_id).await?;
    Ok(web::Json(summary))
}

/// Add an unclaimed item to a list.
#[utoipa::path(
    post,
    path = "/api/v1/lists/{id}/items",
    params(("id" = String, Path, description = "List identifier")),
    request_body = NameRequest,
    responses(
        (status = 201, description = "Item added", body = ItemView),
        (status = 400, description = "Invalid name", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Not a member", body = Error),
        (status = 404, description = "List not found", body = Error)
    ),
    tags = ["items"],
    operation_id = "addItem"
)]
#[post("/lists/{id}/items")]
pub async fn add_item(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<NameRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let list_id = parse_list_id(&path)?;
    let name = ItemName::new(payload.into_inner().name).map_err(item_name_error)?;
    let item = state.lists.add_item(list_id, user_id, name).await?;
    Ok(HttpResponse::Created().json(item))
}

#[cfg(test)]
#[path = "lists_tests.rs"]
mod tests;
