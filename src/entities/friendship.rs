//! Friendship entity - One member's saved contact.
//!
//! Friendships are one-directional: `member_id` keeps `friend_id` in their list
//! without the reverse being implied.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Friendship database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "friendships")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Member owning the friend list
    pub member_id: i64,
    /// Member on the list
    pub friend_id: i64,
    /// When the friend was added
    pub created_at: DateTimeUtc,
}

/// Both columns point at the members table
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Owner of the list
    #[sea_orm(
        belongs_to = "super::member::Entity",
        from = "Column::MemberId",
        to = "super::member::Column::Id"
    )]
    Member,
    /// Member on the list
    #[sea_orm(
        belongs_to = "super::member::Entity",
        from = "Column::FriendId",
        to = "super::member::Column::Id"
    )]
    Friend,
}

impl ActiveModelBehavior for ActiveModel {}
