//! Port for durable list, membership and item storage.
//!
//! Adapters must provide two atomic primitives the list service depends on:
//!
//! - [`ListRepository::delete_list`] removes every item of the list and then
//!   the list itself as one unit.
//! - [`ListRepository::compare_and_set_claim`] writes a claim state only when
//!   the stored state still equals the state the caller evaluated against.

use async_trait::async_trait;

use crate::domain::{ClaimState, Item, ItemId, ListId, SharedList, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by list repository adapters.
    pub enum ListRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "list repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "list repository query failed: {message}",
        /// The list referenced by a write no longer exists.
        ListNotFound => "list no longer exists",
    }
}

/// Outcome of a conditional claim write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimWrite {
    /// The stored state matched; carries the updated item.
    Applied(Item),
    /// The stored state had moved on; carries the current item, or `None`
    /// when the item has been deleted meanwhile.
    Stale(Option<Item>),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListRepository: Send + Sync {
    /// Persist a new list together with its initial member set.
    async fn create_list(&self, list: &SharedList) -> Result<(), ListRepositoryError>;

    async fn find_list(&self, id: &ListId) -> Result<Option<SharedList>, ListRepositoryError>;

    /// Lists the user owns or belongs to, oldest first.
    async fn lists_for_member(&self, user: &UserId)
    -> Result<Vec<SharedList>, ListRepositoryError>;

    /// Add a member. Returns `false` when the user already belonged to the list.
    async fn add_member(&self, list: &ListId, user: &UserId) -> Result<bool, ListRepositoryError>;

    /// Delete the list and all of its items. Returns `false` when absent.
    async fn delete_list(&self, id: &ListId) -> Result<bool, ListRepositoryError>;

    /// Insert an item; fails with `ListNotFound` if the list vanished.
    async fn insert_item(&self, item: &Item) -> Result<(), ListRepositoryError>;

    async fn find_item(&self, id: &ItemId) -> Result<Option<Item>, ListRepositoryError>;

    /// Items of a list, oldest first.
    async fn items_for_list(&self, list: &ListId) -> Result<Vec<Item>, ListRepositoryError>;

    /// Delete an item, returning it when it existed.
    async fn delete_item(&self, id: &ItemId) -> Result<Option<Item>, ListRepositoryError>;

    /// Atomically replace `expected` with `next` for the item.
    async fn compare_and_set_claim(
        &self,
        id: &ItemId,
        expected: ClaimState,
        next: ClaimState,
    ) -> Result<ClaimWrite, ListRepositoryError>;
}
