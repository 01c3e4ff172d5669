//! Friend lists - the members someone keeps handy when filling a group.
//!
//! A friendship row belongs to the member who created it. Adding Rahul to Priya's
//! list does not put Priya on Rahul's.

use super::{
    group::get_group_member_ids,
    member::ensure_members_exist,
    model::{GroupId, Member, MemberId},
};
use crate::{
    entities::{self, friendship, member},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use std::collections::BTreeSet;
use tracing::{info, instrument};

/// Puts `friend` on `member`'s friend list and returns the friend.
///
/// # Errors
/// - [`Error::CannotFriendSelf`] if both ids are the same
/// - [`Error::MemberNotFound`] if either member does not exist
/// - [`Error::AlreadyFriends`] if the friendship is already recorded
#[instrument(skip(db))]
pub async fn add_friend(
    db: &DatabaseConnection,
    member: MemberId,
    friend: MemberId,
) -> Result<Member> {
    if member == friend {
        return Err(Error::CannotFriendSelf { member });
    }

    let txn = db.begin().await?;
    ensure_members_exist(&txn, &[member, friend]).await?;

    if friend_ids(&txn, member).await?.contains(&friend) {
        return Err(Error::AlreadyFriends { member, friend });
    }

    friendship::ActiveModel {
        member_id: Set(member.0),
        friend_id: Set(friend.0),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let added = entities::Member::find_by_id(friend.0)
        .one(&txn)
        .await?
        .ok_or(Error::MemberNotFound { member: friend })?;

    txn.commit().await?;

    info!("Member {member} added {friend} as a friend");
    Ok(added.into())
}

/// Takes `friend` off `member`'s list. Returns false when they were not on it.
pub async fn remove_friend(
    db: &DatabaseConnection,
    member: MemberId,
    friend: MemberId,
) -> Result<bool> {
    let result = entities::Friendship::delete_many()
        .filter(friendship::Column::MemberId.eq(member.0))
        .filter(friendship::Column::FriendId.eq(friend.0))
        .exec(db)
        .await?;

    Ok(result.rows_affected > 0)
}

/// Lists a member's friends, ordered by display name.
pub async fn get_friends(db: &DatabaseConnection, member: MemberId) -> Result<Vec<Member>> {
    let ids: Vec<i64> = friend_ids(db, member).await?.into_iter().map(|id| id.0).collect();
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    Ok(entities::Member::find()
        .filter(member::Column::Id.is_in(ids))
        .order_by_asc(member::Column::DisplayName)
        .order_by_asc(member::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect())
}

/// Friends of `member` who are not in the group yet.
pub async fn get_friends_not_in_group(
    db: &DatabaseConnection,
    member: MemberId,
    group_id: GroupId,
) -> Result<Vec<Member>> {
    let in_group = get_group_member_ids(db, group_id).await?;
    let mut friends = get_friends(db, member).await?;
    friends.retain(|friend| !in_group.contains(&friend.id));
    Ok(friends)
}

/// Members whose name contains `query` and who are neither `member` nor one of
/// their friends. Matching ignores case.
pub async fn suggest_friends(
    db: &DatabaseConnection,
    member: MemberId,
    query: &str,
) -> Result<Vec<Member>> {
    let query = query.trim().to_lowercase();
    let mut excluded = friend_ids(db, member).await?;
    excluded.insert(member);

    Ok(entities::Member::find()
        .order_by_asc(member::Column::DisplayName)
        .all(db)
        .await?
        .into_iter()
        .map(Member::from)
        .filter(|candidate| !excluded.contains(&candidate.id))
        .filter(|candidate| candidate.display_name.to_lowercase().contains(&query))
        .collect())
}

async fn friend_ids<C>(db: &C, member: MemberId) -> Result<BTreeSet<MemberId>>
where
    C: ConnectionTrait,
{
    Ok(entities::Friendship::find()
        .filter(friendship::Column::MemberId.eq(member.0))
        .all(db)
        .await?
        .into_iter()
        .map(|row| MemberId(row.friend_id))
        .collect())
}
