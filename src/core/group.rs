//! Group business logic - creating groups and managing their membership.
//!
//! A group's creator is always its first member: the group row and the creator's
//! membership row are inserted in the same database transaction. Membership only
//! grows through [`add_members`].

use super::{
    member::ensure_members_exist,
    model::{Group, GroupId, Member, MemberId},
};
use crate::{
    entities::{self, group, group_member, member},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use std::collections::BTreeSet;
use tracing::{info, instrument};

/// Creates a group and makes `creator` its first member.
///
/// # Errors
/// - [`Error::Config`] if the name is empty
/// - [`Error::MemberNotFound`] if the creator does not exist
pub async fn create_group(
    db: &DatabaseConnection,
    name: String,
    description: Option<String>,
    creator: MemberId,
) -> Result<Group> {
    if name.trim().is_empty() {
        return Err(Error::Config {
            message: "Group name cannot be empty".to_string(),
        });
    }

    let txn = db.begin().await?;
    ensure_members_exist(&txn, &[creator]).await?;

    let now = Utc::now();
    let group = group::ActiveModel {
        name: Set(name.trim().to_string()),
        description: Set(description.filter(|d| !d.trim().is_empty())),
        created_by: Set(creator.0),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    group_member::ActiveModel {
        group_id: Set(group.id),
        member_id: Set(creator.0),
        added_by: Set(None),
        joined_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    info!(group_id = group.id, "Created group {:?}", group.name);
    Ok(group.into())
}

/// Finds a group by id.
pub async fn get_group_by_id(db: &DatabaseConnection, group_id: GroupId) -> Result<Option<Group>> {
    Ok(entities::Group::find_by_id(group_id.0)
        .one(db)
        .await?
        .map(Into::into))
}

/// Lists the groups a member belongs to, ordered alphabetically by name.
pub async fn get_groups_for_member(
    db: &DatabaseConnection,
    member_id: MemberId,
) -> Result<Vec<Group>> {
    Ok(entities::Group::find()
        .inner_join(entities::GroupMember)
        .filter(group_member::Column::MemberId.eq(member_id.0))
        .order_by_asc(group::Column::Name)
        .all(db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect())
}

/// Lists the members of a group, ordered by member id.
pub async fn get_group_members<C>(db: &C, group_id: GroupId) -> Result<Vec<Member>>
where
    C: ConnectionTrait,
{
    Ok(entities::Member::find()
        .inner_join(entities::GroupMember)
        .filter(group_member::Column::GroupId.eq(group_id.0))
        .order_by_asc(member::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect())
}

/// Ids of the members of a group.
pub(crate) async fn get_group_member_ids<C>(db: &C, group_id: GroupId) -> Result<BTreeSet<MemberId>>
where
    C: ConnectionTrait,
{
    Ok(entities::GroupMember::find()
        .filter(group_member::Column::GroupId.eq(group_id.0))
        .all(db)
        .await?
        .into_iter()
        .map(|row| MemberId(row.member_id))
        .collect())
}

/// Loads a group or fails with [`Error::GroupNotFound`].
pub(crate) async fn require_group<C>(db: &C, group_id: GroupId) -> Result<group::Model>
where
    C: ConnectionTrait,
{
    entities::Group::find_by_id(group_id.0)
        .one(db)
        .await?
        .ok_or(Error::GroupNotFound { group: group_id })
}

/// Adds members to a group on behalf of `added_by`, who must already belong to it.
///
/// Members that are already in the group are skipped. Returns the ids that were
/// actually added, in ascending order.
///
/// # Errors
/// - [`Error::GroupNotFound`] if the group does not exist
/// - [`Error::NotAGroupMember`] if `added_by` is not in the group
/// - [`Error::MemberNotFound`] if one of the members does not exist
#[instrument(skip(db, member_ids))]
pub async fn add_members(
    db: &DatabaseConnection,
    group_id: GroupId,
    member_ids: &[MemberId],
    added_by: MemberId,
) -> Result<Vec<MemberId>> {
    let txn = db.begin().await?;
    require_group(&txn, group_id).await?;

    let existing = get_group_member_ids(&txn, group_id).await?;
    if !existing.contains(&added_by) {
        return Err(Error::NotAGroupMember {
            member: added_by,
            group: group_id,
        });
    }

    ensure_members_exist(&txn, member_ids).await?;

    let to_add: BTreeSet<MemberId> = member_ids
        .iter()
        .copied()
        .filter(|id| !existing.contains(id))
        .collect();

    let now = Utc::now();
    for member_id in &to_add {
        group_member::ActiveModel {
            group_id: Set(group_id.0),
            member_id: Set(member_id.0),
            added_by: Set(Some(added_by.0)),
            joined_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;

    info!("Added {} member(s) to group {group_id}", to_add.len());
    Ok(to_add.into_iter().collect())
}
