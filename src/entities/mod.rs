//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod expense;
pub mod friendship;
pub mod group;
pub mod group_member;
pub mod member;
pub mod split;

// Re-export specific types to avoid conflicts
pub use expense::{Column as ExpenseColumn, Entity as Expense, Model as ExpenseModel};
pub use friendship::{
    Column as FriendshipColumn, Entity as Friendship, Model as FriendshipModel,
};
pub use group::{Column as GroupColumn, Entity as Group, Model as GroupModel};
pub use group_member::{
    Column as GroupMemberColumn, Entity as GroupMember, Model as GroupMemberModel,
};
pub use member::{Column as MemberColumn, Entity as Member, Model as MemberModel};
pub use split::{Column as SplitColumn, Entity as Split, Model as SplitModel};
