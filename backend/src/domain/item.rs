//! List items and their canonical wire view.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::claim::ClaimState;
use super::list::ListId;
use super::user::ClaimantSummary;

/// Maximum allowed length for an item name.
pub const ITEM_NAME_MAX: usize = 200;

/// Validation errors for item primitives.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ItemValidationError {
    #[error("item id must be a valid UUID")]
    InvalidId,
    #[error("item name must not be empty")]
    EmptyName,
    #[error("item name must be at most {max} characters")]
    NameTooLong { max: usize },
}

/// Stable item identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Uuid);

impl ItemId {
    pub fn new(id: impl AsRef<str>) -> Result<Self, ItemValidationError> {
        Uuid::parse_str(id.as_ref())
            .map(Self)
            .map_err(|_| ItemValidationError::InvalidId)
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

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display name of an item, trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemName(String);

impl ItemName {
    pub fn new(raw: impl Into<String>) -> Result<Self, ItemValidationError> {
        let raw = raw.into();
        let value = raw.trim();
        if value.is_empty() {
            return Err(ItemValidationError::EmptyName);
        }
        if value.chars().count() > ITEM_NAME_MAX {
            return Err(ItemValidationError::NameTooLong { max: ITEM_NAME_MAX });
        }
        Ok(Self(value.to_owned()))
    }
}

impl AsRef<str> for ItemName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<ItemName> for String {
    fn from(value: ItemName) -> Self {
        value.0
    }
}

impl TryFrom<String> for ItemName {
    type Error = ItemValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Item belonging to exactly one list for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    pub list_id: ListId,
    pub name: ItemName,
    pub claim: ClaimState,
    pub created_at: DateTime<Utc>,
}

impl Item {
    /// Create an unclaimed item.
    pub fn new(list_id: ListId, name: ItemName, created_at: DateTime<Utc>) -> Self {
        Self {
            id: ItemId::random(),
            list_id,
            name,
            claim: ClaimState::Unclaimed,
            created_at,
        }
    }

    /// Copy of this item with a different claim state.
    pub fn with_claim(&self, claim: ClaimState) -> Self {
        Self {
            claim,
            ..self.clone()
        }
    }
}

/// Canonical item payload shared by HTTP responses and fan-out events.
///
/// `claimed` is `true` exactly when `claimedBy` is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemView {
    #[schema(value_type = String)]
    pub id: ItemId,
    #[schema(value_type = String)]
    pub list_id: ListId,
    #[schema(value_type = String, example = "Oat milk")]
    pub name: ItemName,
    pub claimed: bool,
    pub claimed_by: Option<ClaimantSummary>,
}

impl ItemView {
    /// Build the view from an item and its resolved claimant.
    ///
    /// A claimant is dropped when the item is unclaimed so the flag and the
    /// identity can never disagree on the wire.
    pub fn new(item: &Item, claimant: Option<ClaimantSummary>) -> Self {
        let claimed = item.claim.is_claimed();
        Self {
            id: item.id,
            list_id: item.list_id,
            name: item.name.clone(),
            claimed,
            claimed_by: claimant.filter(|_| claimed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{UserId, Username};

    fn item(claim: ClaimState) -> Item {
        Item::new(
            ListId::random(),
            ItemName::new("Candles").expect("valid name"),
            Utc::now(),
        )
        .with_claim(claim)
    }

    fn claimant(id: UserId) -> ClaimantSummary {
        ClaimantSummary {
            id,
            username: Username::new("ada").expect("valid username"),
        }
    }

    #[test]
    fn new_items_start_unclaimed() {
        assert_eq!(item(ClaimState::Unclaimed).claim, ClaimState::Unclaimed);
    }

    #[test]
    fn view_drops_claimant_for_unclaimed_items() {
        let view = ItemView::new(&item(ClaimState::Unclaimed), Some(claimant(UserId::random())));
        assert!(!view.claimed);
        assert!(view.claimed_by.is_none());
    }

    #[test]
    fn view_serialises_camel_case() {
        let holder = UserId::random();
        let source = item(ClaimState::ClaimedBy(holder));
        let view = ItemView::new(&source, Some(claimant(holder)));
        let value = serde_json::to_value(&view).expect("view serialises");
        assert_eq!(value["claimed"], true);
        assert_eq!(value["claimedBy"]["username"], "ada");
        assert_eq!(value["listId"], source.list_id.to_string());
    }

    #[test]
    fn item_name_rejects_blank() {
        assert_eq!(ItemName::new(" \t"), Err(ItemValidationError::EmptyName));
    }
}
