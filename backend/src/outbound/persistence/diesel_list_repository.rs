//! PostgreSQL-backed `ListRepository` implementation using Diesel ORM.
//!
//! Cascading list deletion runs in one transaction that removes items and
//! memberships before the list row. Claim writes are a single conditional
//! `UPDATE` whose predicate is the claim state the caller evaluated.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};
use tracing::warn;
use uuid::Uuid;

use crate::domain::ports::{ClaimWrite, ListRepository, ListRepositoryError};
use crate::domain::{ClaimState, Item, ItemId, ItemName, ListId, ListName, SharedList, UserId};

use super::diesel_basic_error_mapping::{
    is_foreign_key_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::{ItemRow, ListRow, MemberRow, NewListRow};
use super::pool::{DbPool, PoolError};
use super::schema::{items, list_members, lists};

/// Diesel-backed implementation of the `ListRepository` port.
#[derive(Clone)]
pub struct DieselListRepository {
    pool: DbPool,
}

impl DieselListRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ListRepositoryError {
    map_basic_pool_error(error, ListRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> ListRepositoryError {
    if is_foreign_key_violation(&error) {
        return ListRepositoryError::list_not_found();
    }
    map_basic_diesel_error(
        error,
        ListRepositoryError::query,
        ListRepositoryError::connection,
    )
}

fn row_to_list(row: ListRow, members: Vec<Uuid>) -> Result<SharedList, ListRepositoryError> {
    let name = ListName::new(row.name).map_err(|err| {
        warn!(list_id = %row.id, error = %err, "stored list name failed validation");
        ListRepositoryError::query("stored list has invalid name")
    })?;
    Ok(SharedList::from_parts(
        ListId::from_uuid(row.id),
        name,
        UserId::from_uuid(row.owner_id),
        members.into_iter().map(UserId::from_uuid),
    ))
}

fn row_to_item(row: ItemRow) -> Result<Item, ListRepositoryError> {
    let name = ItemName::new(row.name).map_err(|err| {
        warn!(item_id = %row.id, error = %err, "stored item name failed validation");
        ListRepositoryError::query("stored item has invalid name")
    })?;
    let claim = ClaimState::from_columns(row.claimed, row.claimed_by.map(UserId::from_uuid))
        .map_err(|err| {
            warn!(item_id = %row.id, error = %err, "stored claim columns disagree");
            ListRepositoryError::query("stored item has inconsistent claim")
        })?;
    Ok(Item {
        id: ItemId::from_uuid(row.id),
        list_id: ListId::from_uuid(row.list_id),
        name,
        claim,
        created_at: row.created_at,
    })
}

fn claim_columns(claim: ClaimState) -> (bool, Option<Uuid>) {
    (claim.is_claimed(), claim.claimant().map(|id| *id.as_uuid()))
}

async fn load_members(
    conn: &mut AsyncPgConnection,
    list_ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, Vec<Uuid>>, diesel::result::Error> {
    let rows: Vec<MemberRow> = list_members::table
        .filter(list_members::list_id.eq_any(list_ids))
        .select(MemberRow::as_select())
        .order_by((list_members::joined_at, list_members::user_id))
        .load(conn)
        .await?;
    let mut grouped: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for row in rows {
        grouped.entry(row.list_id).or_default().push(row.user_id);
    }
    Ok(grouped)
}

async fn find_item_row(
    conn: &mut AsyncPgConnection,
    id: Uuid,
) -> Result<Option<ItemRow>, diesel::result::Error> {
    items::table
        .filter(items::id.eq(id))
        .select(ItemRow::as_select())
        .first(conn)
        .await
        .optional()
}

#[async_trait]
impl ListRepository for DieselListRepository {
    async fn create_list(&self, list: &SharedList) -> Result<(), ListRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let list_id = *list.id().as_uuid();
        let row = NewListRow {
            id: list_id,
            name: list.name().as_ref(),
            owner_id: *list.owner().as_uuid(),
        };
        let members: Vec<MemberRow> = list
            .members()
            .map(|user| MemberRow {
                list_id,
                user_id: *user.as_uuid(),
            })
            .collect();
        conn.transaction(|conn| {
            async move {
                diesel::insert_into(lists::table)
                    .values(&row)
                    .execute(conn)
                    .await?;
                diesel::insert_into(list_members::table)
                    .values(&members)
                    .execute(conn)
                    .await?;
                Ok::<_, diesel::result::Error>(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn find_list(&self, id: &ListId) -> Result<Option<SharedList>, ListRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let Some(row) = lists::table
            .filter(lists::id.eq(id.as_uuid()))
            .select(ListRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
        else {
            return Ok(None);
        };
        let mut members = load_members(&mut conn, vec![row.id])
            .await
            .map_err(map_diesel_error)?;
        let list_members = members.remove(&row.id).unwrap_or_default();
        row_to_list(row, list_members).map(Some)
    }

    async fn lists_for_member(
        &self,
        user: &UserId,
    ) -> Result<Vec<SharedList>, ListRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ListRow> = lists::table
            .inner_join(list_members::table)
            .filter(list_members::user_id.eq(user.as_uuid()))
            .select(ListRow::as_select())
            .order_by((lists::created_at, lists::id))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let mut members = load_members(&mut conn, rows.iter().map(|row| row.id).collect())
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter()
            .map(|row| {
                let list_members = members.remove(&row.id).unwrap_or_default();
                row_to_list(row, list_members)
            })
            .collect()
    }

    async fn add_member(&self, list: &ListId, user: &UserId) -> Result<bool, ListRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let inserted = diesel::insert_into(list_members::table)
            .values(MemberRow {
                list_id: *list.as_uuid(),
                user_id: *user.as_uuid(),
            })
            .on_conflict_do_nothing()
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(inserted > 0)
    }

    async fn delete_list(&self, id: &ListId) -> Result<bool, ListRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let list_id = *id.as_uuid();
        let deleted = conn
            .transaction(|conn| {
                async move {
                    diesel::delete(items::table.filter(items::list_id.eq(list_id)))
                        .execute(conn)
                        .await?;
                    diesel::delete(list_members::table.filter(list_members::list_id.eq(list_id)))
                        .execute(conn)
                        .await?;
                    diesel::delete(lists::table.filter(lists::id.eq(list_id)))
                        .execute(conn)
                        .await
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn insert_item(&self, item: &Item) -> Result<(), ListRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (claimed, claimed_by) = claim_columns(item.claim);
        let row = ItemRow {
            id: *item.id.as_uuid(),
            list_id: *item.list_id.as_uuid(),
            name: item.name.as_ref().to_owned(),
            claimed,
            claimed_by,
            created_at: item.created_at,
        };
        diesel::insert_into(items::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_item(&self, id: &ItemId) -> Result<Option<Item>, ListRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        find_item_row(&mut conn, *id.as_uuid())
            .await
            .map_err(map_diesel_error)?
            .map(row_to_item)
            .transpose()
    }

    async fn items_for_list(&self, list: &ListId) -> Result<Vec<Item>, ListRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        items::table
            .filter(items::list_id.eq(list.as_uuid()))
            .select(ItemRow::as_select())
            .order_by((items::created_at, items::id))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?
            .into_iter()
            .map(row_to_item)
            .collect()
    }

    async fn delete_item(&self, id: &ItemId) -> Result<Option<Item>, ListRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::delete(items::table.filter(items::id.eq(id.as_uuid())))
            .returning(ItemRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_item)
            .transpose()
    }

    async fn compare_and_set_claim(
        &self,
        id: &ItemId,
        expected: ClaimState,
        next: ClaimState,
    ) -> Result<ClaimWrite, ListRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let item_id = *id.as_uuid();
        let (claimed, claimed_by) = claim_columns(next);
        let changes = (items::claimed.eq(claimed), items::claimed_by.eq(claimed_by));

        let applied: Option<ItemRow> = match expected {
            ClaimState::Unclaimed => {
                diesel::update(
                    items::table
                        .filter(items::id.eq(item_id))
                        .filter(items::claimed.eq(false)),
                )
                .set(changes)
                .returning(ItemRow::as_returning())
                .get_result(&mut conn)
                .await
            }
            ClaimState::ClaimedBy(holder) => {
                diesel::update(
                    items::table
                        .filter(items::id.eq(item_id))
                        .filter(items::claimed_by.eq(*holder.as_uuid())),
                )
                .set(changes)
                .returning(ItemRow::as_returning())
                .get_result(&mut conn)
                .await
            }
        }
        .optional()
        .map_err(map_diesel_error)?;

        if let Some(row) = applied {
            return row_to_item(row).map(ClaimWrite::Applied);
        }
        let current = find_item_row(&mut conn, item_id)
            .await
            .map_err(map_diesel_error)?
            .map(row_to_item)
            .transpose()?;
        Ok(ClaimWrite::Stale(current))
    }
}
