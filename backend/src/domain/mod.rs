//! Domain primitives, aggregates and services.
//!
//! Purpose: define the strongly typed entities shared by the HTTP, WebSocket
//! and persistence adapters, and the services that enforce list membership,
//! claim transitions, event publication and credential recovery.
//!
//! Public surface:
//! - Error (alias to `error::Error`): API error response payload.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - SharedList, Item, ClaimState: list state and the claim state machine.
//! - ListService, AccountManager, PasswordRecovery: driving port
//!   implementations.

pub mod account_service;
pub mod auth;
pub mod claim;
pub mod error;
pub mod events;
pub mod item;
pub mod list;
pub mod list_locks;
pub mod list_service;
pub mod membership;
pub mod one_time_code;
pub mod ports;
pub mod recovery;
pub mod trace_id;
pub mod user;

pub use self::account_service::AccountManager;
pub use self::auth::{
    CredentialValidationError, LoginCredentials, NewPassword, PASSWORD_MAX, PASSWORD_MIN,
    Registration,
};
pub use self::claim::{ClaimConflict, ClaimState, InconsistentClaim};
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::events::{ConnectionId, ListEvent, LiveConnection, TopicEvent};
pub use self::item::{ITEM_NAME_MAX, Item, ItemId, ItemName, ItemValidationError, ItemView};
pub use self::list::{
    LIST_NAME_MAX, ListDetails, ListId, ListName, ListSummary, ListValidationError, SharedList,
};
pub use self::list_locks::{ListGuard, ListLocks};
pub use self::list_service::{ListService, MAX_CLAIM_ATTEMPTS};
pub use self::membership::{Access, MembershipAuthority};
pub use self::one_time_code::{CODE_DIGITS, OneTimeCode, OneTimeCodeError, ResetToken};
pub use self::recovery::{
    CODE_TTL, MAX_FAILED_VERIFICATIONS, PasswordRecovery, RESET_TOKEN_TTL, RecoveryPorts,
};
pub use self::trace_id::TraceId;
pub use self::user::{
    AvatarUrl, ClaimantSummary, EMAIL_MAX, EmailAddress, MemberSummary, PasswordDigest,
    USERNAME_MAX, User, UserId, UserProfile, UserValidationError, Username,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use synclist::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
