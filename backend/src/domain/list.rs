//! Shared list aggregate.
//!
//! A list always counts its owner among its members. Membership only grows
//! through [`SharedList::add_member`]; the list disappears as a whole when the
//! owner deletes it.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::item::ItemView;
use super::user::{MemberSummary, UserId};

/// Maximum allowed length for a list name.
pub const LIST_NAME_MAX: usize = 100;

/// Validation errors for list primitives.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListValidationError {
    #[error("list id must be a valid UUID")]
    InvalidId,
    #[error("list name must not be empty")]
    EmptyName,
    #[error("list name must be at most {max} characters")]
    NameTooLong { max: usize },
}

/// Stable list identifier; doubles as the fan-out topic key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListId(Uuid);

impl ListId {
    pub fn new(id: impl AsRef<str>) -> Result<Self, ListValidationError> {
        Uuid::parse_str(id.as_ref())
            .map(Self)
            .map_err(|_| ListValidationError::InvalidId)
    }

    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display name of a list, trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ListName(String);

impl ListName {
    pub fn new(raw: impl Into<String>) -> Result<Self, ListValidationError> {
        let raw = raw.into();
        let value = raw.trim();
        if value.is_empty() {
            return Err(ListValidationError::EmptyName);
        }
        if value.chars().count() > LIST_NAME_MAX {
            return Err(ListValidationError::NameTooLong { max: LIST_NAME_MAX });
        }
        Ok(Self(value.to_owned()))
    }
}

impl AsRef<str> for ListName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<ListName> for String {
    fn from(value: ListName) -> Self {
        value.0
    }
}

impl TryFrom<String> for ListName {
    type Error = ListValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Shared list with its owner and member set.
///
/// ## Invariants
/// - `owner` is always contained in `members`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedList {
    id: ListId,
    name: ListName,
    owner: UserId,
    members: BTreeSet<UserId>,
}

impl SharedList {
    /// Create a fresh list whose only member is its owner.
    pub fn new(id: ListId, name: ListName, owner: UserId) -> Self {
        Self {
            id,
            name,
            owner,
            members: BTreeSet::from([owner]),
        }
    }

    /// Rebuild a list from stored parts, restoring the owner membership if
    /// the stored member set omitted it.
    pub fn from_parts(
        id: ListId,
        name: ListName,
        owner: UserId,
        members: impl IntoIterator<Item = UserId>,
    ) -> Self {
        let mut members: BTreeSet<UserId> = members.into_iter().collect();
        members.insert(owner);
        Self {
            id,
            name,
            owner,
            members,
        }
    }

    pub fn id(&self) -> ListId {
        self.id
    }

    pub fn name(&self) -> &ListName {
        &self.name
    }

    pub fn owner(&self) -> UserId {
        self.owner
    }

    pub fn members(&self) -> impl Iterator<Item = UserId> + '_ {
        self.members.iter().copied()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_member(&self, user: UserId) -> bool {
        self.members.contains(&user)
    }

    pub fn is_owner(&self, user: UserId) -> bool {
        self.owner == user
    }

    /// Add `user` to the member set. Returns `false` when already a member.
    pub fn add_member(&mut self, user: UserId) -> bool {
        self.members.insert(user)
    }

    /// Summary returned by list collection endpoints.
    pub fn summary(&self) -> ListSummary {
        ListSummary {
            id: self.id,
            name: self.name.clone(),
            owner_id: self.owner,
            member_count: self.members.len(),
        }
    }
}

/// Compact list view for "my lists".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListSummary {
    #[schema(value_type = String)]
    pub id: ListId,
    #[schema(value_type = String, example = "Birthday gifts")]
    pub name: ListName,
    #[schema(value_type = String)]
    pub owner_id: UserId,
    pub member_count: usize,
}

/// Full list view with resolved members and items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListDetails {
    #[schema(value_type = String)]
    pub id: ListId,
    #[schema(value_type = String)]
    pub name: ListName,
    #[schema(value_type = String)]
    pub owner_id: UserId,
    pub members: Vec<MemberSummary>,
    pub items: Vec<ItemView>,
}
