//! HTTP inbound adapter exposing REST endpoints.
//!
//! Every handler is mounted beneath `/api/v1` by [`configure_api`]. Health
//! probes sit outside the versioned scope and are registered by the server.

pub mod auth;
pub mod error;
pub mod health;
pub mod items;
pub mod lists;
pub mod password_reset;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod validation;

use actix_web::web;

pub use error::ApiResult;

/// Register every versioned REST handler on the given scope.
///
/// # Examples
/// ```
/// use actix_web::{App, web};
///
/// let _app = App::new().service(web::scope("/api/v1").configure(synclist::inbound::http::configure_api));
/// ```
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(auth::register)
        .service(auth::login)
        .service(auth::logout)
        .service(password_reset::request_code)
        .service(password_reset::verify_code)
        .service(password_reset::reset_password)
        .service(users::current_user)
        .service(users::update_avatar)
        .service(lists::my_lists)
        .service(lists::create_list)
        .service(lists::list_details)
        .service(lists::delete_list)
        .service(lists::join_list)
        .service(lists::add_item)
        .service(items::remove_item)
        .service(items::toggle_claim);
}
