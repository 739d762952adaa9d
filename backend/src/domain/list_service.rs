//! List domain service implementing the `ListCommand` and `ListQuery`
//! driving ports.
//!
//! Mutations follow one shape: take the list lock, authorise through the
//! [`MembershipAuthority`], commit through the repository, then publish the
//! canonical post-mutation payload to the list topic. Publication happens
//! strictly after commit and never fails the mutation.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, info, warn};

use crate::domain::ports::{
    ClaimWrite, ListCommand, ListEventPublisher, ListQuery, ListRepository, ListRepositoryError,
    UserPersistenceError, UserRepository,
};
use crate::domain::{
    Access, ClaimantSummary, Error, Item, ItemId, ItemName, ItemView, ListDetails, ListEvent,
    ListGuard, ListId, ListLocks, ListName, ListSummary, MembershipAuthority, SharedList, User,
    UserId,
};

/// Conditional claim writes attempted before contention is reported.
pub const MAX_CLAIM_ATTEMPTS: usize = 3;

fn map_list_error(error: ListRepositoryError) -> Error {
    match error {
        ListRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("list repository unavailable: {message}"))
        }
        ListRepositoryError::Query { message } => {
            Error::internal(format!("list repository error: {message}"))
        }
        ListRepositoryError::ListNotFound => Error::not_found("list not found"),
    }
}

fn map_user_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserPersistenceError::DuplicateEmail { .. } => {
            Error::internal("unexpected duplicate email during list operation")
        }
    }
}

/// Service coordinating list state, membership and topic publication.
pub struct ListService<L, U> {
    lists: Arc<L>,
    users: Arc<U>,
    publisher: Arc<dyn ListEventPublisher>,
    clock: Arc<dyn Clock>,
    locks: ListLocks,
}

impl<L, U> ListService<L, U>
where
    L: ListRepository,
    U: UserRepository,
{
    pub fn new(
        lists: Arc<L>,
        users: Arc<U>,
        publisher: Arc<dyn ListEventPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            lists,
            users,
            publisher,
            clock,
            locks: ListLocks::new(),
        }
    }

    async fn authorize(
        &self,
        list: ListId,
        user: UserId,
        access: Access,
    ) -> Result<SharedList, Error> {
        let found = self.lists.find_list(&list).await.map_err(map_list_error)?;
        MembershipAuthority::authorize(found, user, access).inspect_err(|error| {
            debug!(list_id = %list, user_id = %user, ?access, code = ?error.code(), "list access denied");
        })
    }

    async fn find_item(&self, item: ItemId) -> Result<Item, Error> {
        self.lists
            .find_item(&item)
            .await
            .map_err(map_list_error)?
            .ok_or_else(|| Error::not_found("item not found"))
    }

    /// Lock the list owning `item` and re-read the item under the lock.
    async fn lock_item(&self, item: ItemId) -> Result<(ListGuard, Item), Error> {
        let list = self.find_item(item).await?.list_id;
        let guard = self.locks.lock(list).await;
        let current = self.find_item(item).await?;
        Ok((guard, current))
    }

    async fn claimant(&self, user: UserId) -> Result<ClaimantSummary, Error> {
        self.users
            .find_by_id(&user)
            .await
            .map_err(map_user_error)?
            .map(|account| account.claimant_summary())
            .ok_or_else(|| Error::unauthorized("account no longer exists"))
    }

    fn publish(&self, list: ListId, event: ListEvent) {
        let kind = event.kind();
        let report = self.publisher.publish(list, event);
        debug!(
            list_id = %list,
            event = kind,
            delivered = report.delivered,
            dropped = report.dropped,
            pruned = report.pruned,
            "list event published"
        );
    }
}

#[async_trait]
impl<L, U> ListCommand for ListService<L, U>
where
    L: ListRepository,
    U: UserRepository,
{
    async fn create_list(&self, owner: UserId, name: ListName) -> Result<ListSummary, Error> {
        let list = SharedList::new(ListId::random(), name, owner);
        self.lists
            .create_list(&list)
            .await
            .map_err(map_list_error)?;
        info!(list_id = %list.id(), owner_id = %owner, "list created");
        Ok(list.summary())
    }

    async fn join_list(&self, list: ListId, user: UserId) -> Result<ListSummary, Error> {
        let _guard = self.locks.lock(list).await;
        let mut found = self
            .lists
            .find_list(&list)
            .await
            .map_err(map_list_error)?
            .ok_or_else(|| Error::not_found("list not found"))?;
        if found.is_member(user) {
            return Ok(found.summary());
        }
        let added = self
            .lists
            .add_member(&list, &user)
            .await
            .map_err(map_list_error)?;
        found.add_member(user);
        if added {
            info!(list_id = %list, user_id = %user, "member joined list");
        }
        Ok(found.summary())
    }

    async fn delete_list(&self, list: ListId, requester: UserId) -> Result<(), Error> {
        let _guard = self.locks.lock(list).await;
        self.authorize(list, requester, Access::Own).await?;
        let deleted = self
            .lists
            .delete_list(&list)
            .await
            .map_err(map_list_error)?;
        if !deleted {
            return Err(Error::not_found("list not found"));
        }
        info!(list_id = %list, owner_id = %requester, "list deleted with its items");
        Ok(())
    }

    async fn add_item(
        &self,
        list: ListId,
        requester: UserId,
        name: ItemName,
    ) -> Result<ItemView, Error> {
        let _guard = self.locks.lock(list).await;
        self.authorize(list, requester, Access::Mutate).await?;
        let item = Item::new(list, name, self.clock.utc());
        self.lists
            .insert_item(&item)
            .await
            .map_err(map_list_error)?;
        let view = ItemView::new(&item, None);
        self.publish(list, ListEvent::ItemAdded(view.clone()));
        Ok(view)
    }

    async fn remove_item(&self, item: ItemId, requester: UserId) -> Result<ListId, Error> {
        let (_guard, current) = self.lock_item(item).await?;
        let list = current.list_id;
        self.authorize(list, requester, Access::Mutate).await?;
        self.lists
            .delete_item(&item)
            .await
            .map_err(map_list_error)?
            .ok_or_else(|| Error::not_found("item not found"))?;
        self.publish(list, ListEvent::ItemDeleted { item_id: item });
        Ok(list)
    }

    async fn toggle_claim(&self, item: ItemId, requester: UserId) -> Result<ItemView, Error> {
        let (_guard, mut current) = self.lock_item(item).await?;
        let list = current.list_id;
        self.authorize(list, requester, Access::Mutate).await?;
        let requester_summary = self.claimant(requester).await?;

        for attempt in 1..=MAX_CLAIM_ATTEMPTS {
            let next = current
                .claim
                .toggle(requester)
                .map_err(|_| Error::conflict("item is already claimed by another member"))?;
            match self
                .lists
                .compare_and_set_claim(&item, current.claim, next)
                .await
                .map_err(map_list_error)?
            {
                ClaimWrite::Applied(updated) => {
                    let claimant = updated
                        .claim
                        .is_claimed()
                        .then(|| requester_summary.clone());
                    let view = ItemView::new(&updated, claimant);
                    self.publish(list, ListEvent::ItemUpdated(view.clone()));
                    return Ok(view);
                }
                ClaimWrite::Stale(Some(latest)) => {
                    debug!(item_id = %item, attempt, "claim write lost a race; re-evaluating");
                    current = latest;
                }
                ClaimWrite::Stale(None) => return Err(Error::not_found("item not found")),
            }
        }

        warn!(item_id = %item, attempts = MAX_CLAIM_ATTEMPTS, "claim contention persisted");
        Err(Error::conflict("item claim is contended; try again"))
    }
}

#[async_trait]
impl<L, U> ListQuery for ListService<L, U>
where
    L: ListRepository,
    U: UserRepository,
{
    async fn lists_for_user(&self, user: UserId) -> Result<Vec<ListSummary>, Error> {
        let lists = self
            .lists
            .lists_for_member(&user)
            .await
            .map_err(map_list_error)?;
        Ok(lists.iter().map(SharedList::summary).collect())
    }

    async fn list_details(&self, list: ListId, user: UserId) -> Result<ListDetails, Error> {
        let found = self.authorize(list, user, Access::View).await?;
        let items = self
            .lists
            .items_for_list(&list)
            .await
            .map_err(map_list_error)?;

        let mut wanted: BTreeSet<UserId> = found.members().collect();
        wanted.extend(items.iter().filter_map(|item| item.claim.claimant()));
        let wanted: Vec<UserId> = wanted.into_iter().collect();
        let accounts: HashMap<UserId, User> = self
            .users
            .find_by_ids(&wanted)
            .await
            .map_err(map_user_error)?
            .into_iter()
            .map(|account| (account.id(), account))
            .collect();

        let members = found
            .members()
            .filter_map(|member| match accounts.get(&member) {
                Some(account) => Some(account.member_summary()),
                None => {
                    warn!(list_id = %list, user_id = %member, "member account missing");
                    None
                }
            })
            .collect();
        let items = items
            .iter()
            .map(|item| {
                let claimant = item
                    .claim
                    .claimant()
                    .and_then(|holder| accounts.get(&holder))
                    .map(User::claimant_summary);
                ItemView::new(item, claimant)
            })
            .collect();

        Ok(ListDetails {
            id: found.id(),
            name: found.name().clone(),
            owner_id: found.owner(),
            members,
            items,
        })
    }

    async fn ensure_viewer(&self, list: ListId, user: UserId) -> Result<(), Error> {
        self.authorize(list, user, Access::View).await.map(|_| ())
    }
}

#[cfg(test)]
#[path = "list_service_tests.rs"]
mod tests;
