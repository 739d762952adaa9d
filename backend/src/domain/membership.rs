//! Membership authority.
//!
//! Decides whether an identity may observe, mutate or own a list. Every list
//! mutation and every topic subscription goes through here first. A missing
//! list is reported as `NotFound`; an existing list the caller may not touch
//! is reported as `Forbidden` with a message that reveals nothing about its
//! contents.

use super::Error;
use super::list::SharedList;
use super::user::UserId;

/// Level of access a caller asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Read list state and subscribe to its topic.
    View,
    /// Add, remove or claim items.
    Mutate,
    /// Delete the list.
    Own,
}

/// Stateless policy over [`SharedList`] membership.
#[derive(Debug, Clone, Copy, Default)]
pub struct MembershipAuthority;

impl MembershipAuthority {
    pub fn can_view(list: &SharedList, user: UserId) -> bool {
        list.is_member(user)
    }

    pub fn can_mutate(list: &SharedList, user: UserId) -> bool {
        list.is_member(user)
    }

    pub fn is_owner(list: &SharedList, user: UserId) -> bool {
        list.is_owner(user)
    }

    /// Check `access` for `user` against a looked-up list.
    ///
    /// # Examples
    /// ```
    /// use synclist::domain::{
    ///     Access, ErrorCode, ListId, ListName, MembershipAuthority, SharedList, UserId,
    /// };
    ///
    /// let owner = UserId::random();
    /// let list = SharedList::new(ListId::random(), ListName::new("Gifts").unwrap(), owner);
    /// let stranger = UserId::random();
    ///
    /// let err = MembershipAuthority::authorize(Some(list), stranger, Access::View).unwrap_err();
    /// assert_eq!(err.code(), ErrorCode::Forbidden);
    /// let err = MembershipAuthority::authorize(None, owner, Access::View).unwrap_err();
    /// assert_eq!(err.code(), ErrorCode::NotFound);
    /// ```
    pub fn authorize(
        list: Option<SharedList>,
        user: UserId,
        access: Access,
    ) -> Result<SharedList, Error> {
        let list = list.ok_or_else(|| Error::not_found("list not found"))?;
        let allowed = match access {
            Access::View => Self::can_view(&list, user),
            Access::Mutate => Self::can_mutate(&list, user),
            Access::Own => Self::is_owner(&list, user),
        };
        if allowed {
            return Ok(list);
        }
        Err(match access {
            Access::Own => Error::forbidden("only the list owner may do this"),
            Access::View | Access::Mutate => Error::forbidden("not a member of this list"),
        })
    }
}
