//! Shared validation helpers for inbound HTTP adapters.
//!
//! Every helper returns an `invalid_request` error whose details name the
//! offending request field so clients can highlight it.

use serde_json::json;

use crate::domain::{
    CredentialValidationError, Error, ItemId, ItemValidationError, ListId, ListValidationError,
    OneTimeCodeError, UserValidationError,
};

/// Validation error codes carried in `details.code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ValidationCode {
    InvalidUuid,
    InvalidValue,
}

impl ValidationCode {
    fn as_str(self) -> &'static str {
        match self {
            ValidationCode::InvalidUuid => "invalid_uuid",
            ValidationCode::InvalidValue => "invalid_value",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &'static str {
        self.0
    }
}

pub(crate) const LIST_ID: FieldName = FieldName::new("listId");
pub(crate) const ITEM_ID: FieldName = FieldName::new("itemId");
pub(crate) const NAME: FieldName = FieldName::new("name");
pub(crate) const CODE: FieldName = FieldName::new("code");
pub(crate) const AVATAR_URL: FieldName = FieldName::new("avatarUrl");

fn field_error(field: FieldName, code: ValidationCode, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "code": code.as_str(),
    }))
}

fn invalid_uuid_error(field: FieldName, value: &str) -> Error {
    let name = field.as_str();
    Error::invalid_request(format!("{name} must be a valid UUID")).with_details(json!({
        "field": name,
        "value": value,
        "code": ValidationCode::InvalidUuid.as_str(),
    }))
}

pub(crate) fn parse_list_id(raw: &str) -> Result<ListId, Error> {
    ListId::new(raw).map_err(|_| invalid_uuid_error(LIST_ID, raw))
}

pub(crate) fn parse_item_id(raw: &str) -> Result<ItemId, Error> {
    ItemId::new(raw).map_err(|_| invalid_uuid_error(ITEM_ID, raw))
}

pub(crate) fn credential_error(err: CredentialValidationError) -> Error {
    let field = FieldName::new(err.field());
    field_error(field, ValidationCode::InvalidValue, err.to_string())
}

pub(crate) fn list_name_error(err: ListValidationError) -> Error {
    field_error(NAME, ValidationCode::InvalidValue, err.to_string())
}

pub(crate) fn item_name_error(err: ItemValidationError) -> Error {
    field_error(NAME, ValidationCode::InvalidValue, err.to_string())
}

pub(crate) fn avatar_error(err: UserValidationError) -> Error {
    field_error(AVATAR_URL, ValidationCode::InvalidValue, err.to_string())
}

pub(crate) fn code_error(err: OneTimeCodeError) -> Error {
    field_error(CODE, ValidationCode::InvalidValue, err.to_string())
}
