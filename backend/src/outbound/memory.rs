//! Process-local adapter implementing the repository ports.
//!
//! Used when no database URL is configured and by tests. All state lives
//! behind one mutex so the atomic primitives the ports promise (cascading
//! list delete, conditional claim write, conditional code consumption) hold
//! trivially.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{
    ClaimWrite, ListRepository, ListRepositoryError, OneTimeCodeRecord, OneTimeCodeRepository,
    OneTimeCodeRepositoryError, UserPersistenceError, UserRepository,
};
use crate::domain::{
    AvatarUrl, ClaimState, EmailAddress, Item, ItemId, ListId, ListName, PasswordDigest,
    SharedList, User, UserId,
};

struct StoredList {
    name: ListName,
    owner: UserId,
    members: BTreeSet<UserId>,
    created: u64,
}

impl StoredList {
    fn to_domain(&self, id: ListId) -> SharedList {
        SharedList::from_parts(id, self.name.clone(), self.owner, self.members.iter().copied())
    }
}

#[derive(Default)]
struct State {
    users: HashMap<UserId, User>,
    emails: HashMap<EmailAddress, UserId>,
    lists: HashMap<ListId, StoredList>,
    items: BTreeMap<ItemId, (u64, Item)>,
    codes: Vec<(u64, OneTimeCodeRecord)>,
    sequence: u64,
}

impl State {
    fn tick(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    fn sorted_items(&self, list: &ListId) -> Vec<Item> {
        let mut items: Vec<_> = self
            .items
            .values()
            .filter(|(_, item)| &item.list_id == list)
            .collect();
        items.sort_by_key(|(seq, item)| (item.created_at, *seq));
        items.into_iter().map(|(_, item)| item.clone()).collect()
    }
}

/// In-memory store for users, lists, items and one-time codes.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut state = self.state();
        if state.emails.contains_key(user.email()) {
            return Err(UserPersistenceError::duplicate_email(user.email().as_ref()));
        }
        state.emails.insert(user.email().clone(), user.id());
        state.users.insert(user.id(), user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(self.state().users.get(id).cloned())
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError> {
        let state = self.state();
        Ok(state
            .emails
            .get(email)
            .and_then(|id| state.users.get(id))
            .cloned())
    }

    async fn find_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>, UserPersistenceError> {
        let state = self.state();
        Ok(ids
            .iter()
            .filter_map(|id| state.users.get(id))
            .cloned()
            .collect())
    }

    async fn update_password(
        &self,
        id: &UserId,
        digest: &PasswordDigest,
    ) -> Result<bool, UserPersistenceError> {
        let mut state = self.state();
        let Some(existing) = state.users.get_mut(id) else {
            return Ok(false);
        };
        *existing = User::new(
            existing.id(),
            existing.email().clone(),
            existing.username().clone(),
            digest.clone(),
        )
        .with_avatar(existing.avatar().cloned());
        Ok(true)
    }

    async fn update_avatar(
        &self,
        id: &UserId,
        avatar: Option<AvatarUrl>,
    ) -> Result<bool, UserPersistenceError> {
        let mut state = self.state();
        let Some(existing) = state.users.get_mut(id) else {
            return Ok(false);
        };
        *existing = existing.clone().with_avatar(avatar);
        Ok(true)
    }
}

#[async_trait]
impl ListRepository for InMemoryStore {
    async fn create_list(&self, list: &SharedList) -> Result<(), ListRepositoryError> {
        let mut state = self.state();
        let created = state.tick();
        state.lists.insert(
            list.id(),
            StoredList {
                name: list.name().clone(),
                owner: list.owner(),
                members: list.members().collect(),
                created,
            },
        );
        Ok(())
    }

    async fn find_list(&self, id: &ListId) -> Result<Option<SharedList>, ListRepositoryError> {
        Ok(self.state().lists.get(id).map(|stored| stored.to_domain(*id)))
    }

    async fn lists_for_member(
        &self,
        user: &UserId,
    ) -> Result<Vec<SharedList>, ListRepositoryError> {
        let state = self.state();
        let mut lists: Vec<_> = state
            .lists
            .iter()
            .filter(|(_, stored)| stored.members.contains(user))
            .collect();
        lists.sort_by_key(|(_, stored)| stored.created);
        Ok(lists
            .into_iter()
            .map(|(id, stored)| stored.to_domain(*id))
            .collect())
    }

    async fn add_member(&self, list: &ListId, user: &UserId) -> Result<bool, ListRepositoryError> {
        let mut state = self.state();
        let stored = state
            .lists
            .get_mut(list)
            .ok_or(ListRepositoryError::ListNotFound)?;
        Ok(stored.members.insert(*user))
    }

    async fn delete_list(&self, id: &ListId) -> Result<bool, ListRepositoryError> {
        let mut state = self.state();
        if state.lists.remove(id).is_none() {
            return Ok(false);
        }
        state.items.retain(|_, (_, item)| &item.list_id != id);
        Ok(true)
    }

    async fn insert_item(&self, item: &Item) -> Result<(), ListRepositoryError> {
        let mut state = self.state();
        if !state.lists.contains_key(&item.list_id) {
            return Err(ListRepositoryError::ListNotFound);
        }
        let seq = state.tick();
        state.items.insert(item.id, (seq, item.clone()));
        Ok(())
    }

    async fn find_item(&self, id: &ItemId) -> Result<Option<Item>, ListRepositoryError> {
        Ok(self.state().items.get(id).map(|(_, item)| item.clone()))
    }

    async fn items_for_list(&self, list: &ListId) -> Result<Vec<Item>, ListRepositoryError> {
        Ok(self.state().sorted_items(list))
    }

    async fn delete_item(&self, id: &ItemId) -> Result<Option<Item>, ListRepositoryError> {
        Ok(self.state().items.remove(id).map(|(_, item)| item))
    }

    async fn compare_and_set_claim(
        &self,
        id: &ItemId,
        expected: ClaimState,
        next: ClaimState,
    ) -> Result<ClaimWrite, ListRepositoryError> {
        let mut state = self.state();
        let Some((_, item)) = state.items.get_mut(id) else {
            return Ok(ClaimWrite::Stale(None));
        };
        if item.claim != expected {
            return Ok(ClaimWrite::Stale(Some(item.clone())));
        }
        item.claim = next;
        Ok(ClaimWrite::Applied(item.clone()))
    }
}

#[async_trait]
impl OneTimeCodeRepository for InMemoryStore {
    async fn insert(&self, record: &OneTimeCodeRecord) -> Result<(), OneTimeCodeRepositoryError> {
        let mut state = self.state();
        let seq = state.tick();
        state.codes.push((seq, record.clone()));
        Ok(())
    }

    async fn find(
        &self,
        email: &EmailAddress,
        code_digest: &str,
    ) -> Result<Option<OneTimeCodeRecord>, OneTimeCodeRepositoryError> {
        Ok(self
            .state()
            .codes
            .iter()
            .filter(|(_, record)| &record.email == email && record.code_digest == code_digest)
            .max_by_key(|(seq, record)| (record.created_at, *seq))
            .map(|(_, record)| record.clone()))
    }

    async fn consume(
        &self,
        email: &EmailAddress,
        code_digest: &str,
    ) -> Result<bool, OneTimeCodeRepositoryError> {
        let mut state = self.state();
        let before = state.codes.len();
        state
            .codes
            .retain(|(_, record)| !(&record.email == email && record.code_digest == code_digest));
        Ok(state.codes.len() < before)
    }

    async fn purge_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, OneTimeCodeRepositoryError> {
        let mut state = self.state();
        let before = state.codes.len();
        state.codes.retain(|(_, record)| record.created_at >= cutoff);
        Ok(u64::try_from(before - state.codes.len()).unwrap_or(u64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ItemName, Username};
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    #[fixture]
    fn store() -> InMemoryStore {
        InMemoryStore::new()
    }

    fn user(email: &str) -> User {
        User::new(
            UserId::random(),
            EmailAddress::new(email).expect("email"),
            Username::new("ada").expect("username"),
            PasswordDigest::new("$argon2id$fixture"),
        )
    }

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + seconds, 0)
            .single()
            .expect("timestamp")
    }

    #[rstest]
    #[tokio::test]
    async fn duplicate_email_is_rejected(store: InMemoryStore) {
        UserRepository::insert(&store, &user("a@example.com"))
            .await
            .expect("first insert");
        let err = UserRepository::insert(&store, &user("A@example.com"))
            .await
            .expect_err("duplicate");
        assert_eq!(err.kind(), "duplicate_email");
    }

    #[rstest]
    #[tokio::test]
    async fn deleting_a_list_cascades_to_items(store: InMemoryStore) {
        let owner = UserId::random();
        let list = SharedList::new(ListId::random(), ListName::new("Gifts").expect("name"), owner);
        store.create_list(&list).await.expect("create");
        let item = Item::new(list.id(), ItemName::new("Lamp").expect("name"), at(0));
        store.insert_item(&item).await.expect("insert");

        assert!(store.delete_list(&list.id()).await.expect("delete"));
        assert!(store.find_item(&item.id).await.expect("find").is_none());
        assert!(!store.delete_list(&list.id()).await.expect("repeat delete"));
        let err = store.insert_item(&item).await.expect_err("list gone");
        assert_eq!(err, ListRepositoryError::ListNotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn claim_write_is_conditional(store: InMemoryStore) {
        let owner = UserId::random();
        let list = SharedList::new(ListId::random(), ListName::new("Gifts").expect("name"), owner);
        store.create_list(&list).await.expect("create");
        let item = Item::new(list.id(), ItemName::new("Lamp").expect("name"), at(0));
        store.insert_item(&item).await.expect("insert");

        let claimed = ClaimState::ClaimedBy(owner);
        let first = store
            .compare_and_set_claim(&item.id, ClaimState::Unclaimed, claimed)
            .await
            .expect("cas");
        assert!(matches!(first, ClaimWrite::Applied(ref applied) if applied.claim == claimed));

        let second = store
            .compare_and_set_claim(&item.id, ClaimState::Unclaimed, claimed)
            .await
            .expect("cas");
        assert!(matches!(second, ClaimWrite::Stale(Some(ref latest)) if latest.claim == claimed));
    }

    #[rstest]
    #[tokio::test]
    async fn codes_are_consumed_once_and_purged_by_age(store: InMemoryStore) {
        let email = EmailAddress::new("a@example.com").expect("email");
        let old = OneTimeCodeRecord {
            email: email.clone(),
            code_digest: "old".into(),
            created_at: at(0),
        };
        let fresh = OneTimeCodeRecord {
            email: email.clone(),
            code_digest: "fresh".into(),
            created_at: at(400),
        };
        OneTimeCodeRepository::insert(&store, &old).await.expect("insert");
        OneTimeCodeRepository::insert(&store, &fresh).await.expect("insert");

        assert_eq!(store.purge_created_before(at(100)).await.expect("purge"), 1);
        assert!(store.find(&email, "old").await.expect("find").is_none());
        assert!(store.consume(&email, "fresh").await.expect("consume"));
        assert!(!store.consume(&email, "fresh").await.expect("second consume"));
    }

    #[rstest]
    #[tokio::test]
    async fn items_are_listed_oldest_first(store: InMemoryStore) {
        let owner = UserId::random();
        let list = SharedList::new(ListId::random(), ListName::new("Gifts").expect("name"), owner);
        store.create_list(&list).await.expect("create");
        let later = Item::new(list.id(), ItemName::new("Later").expect("name"), at(10));
        let earlier = Item::new(list.id(), ItemName::new("Earlier").expect("name"), at(5));
        store.insert_item(&later).await.expect("insert");
        store.insert_item(&earlier).await.expect("insert");

        let names: Vec<_> = store
            .items_for_list(&list.id())
            .await
            .expect("items")
            .into_iter()
            .map(|item| item.name.as_ref().to_owned())
            .collect();
        assert_eq!(names, ["Earlier", "Later"]);
    }
}
