//! Driving ports for list mutations and reads.
//!
//! Inbound adapters call these with the authenticated caller's id; every
//! method enforces membership itself so adapters cannot skip the check.

use async_trait::async_trait;

use crate::domain::{
    Error, ItemId, ItemName, ItemView, ListDetails, ListId, ListName, ListSummary, UserId,
};

/// Use-case port for list and item mutations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListCommand: Send + Sync {
    /// Create a list owned by `owner`, who becomes its only member.
    async fn create_list(&self, owner: UserId, name: ListName) -> Result<ListSummary, Error>;

    /// Add `user` to the list's members; repeat calls are no-ops.
    async fn join_list(&self, list: ListId, user: UserId) -> Result<ListSummary, Error>;

    /// Delete the list and all its items. Owner only.
    async fn delete_list(&self, list: ListId, requester: UserId) -> Result<(), Error>;

    /// Add an unclaimed item. Members only.
    async fn add_item(
        &self,
        list: ListId,
        requester: UserId,
        name: ItemName,
    ) -> Result<ItemView, Error>;

    /// Remove an item, returning the list it belonged to. Members only.
    async fn remove_item(&self, item: ItemId, requester: UserId) -> Result<ListId, Error>;

    /// Claim an unclaimed item or release the caller's own claim.
    async fn toggle_claim(&self, item: ItemId, requester: UserId) -> Result<ItemView, Error>;
}

/// Use-case port for list reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListQuery: Send + Sync {
    /// Lists the user owns or belongs to.
    async fn lists_for_user(&self, user: UserId) -> Result<Vec<ListSummary>, Error>;

    /// Members and items of a list the user may view.
    async fn list_details(&self, list: ListId, user: UserId) -> Result<ListDetails, Error>;

    /// Confirm `user` may observe `list`; used before topic subscription.
    async fn ensure_viewer(&self, list: ListId, user: UserId) -> Result<(), Error>;
}
