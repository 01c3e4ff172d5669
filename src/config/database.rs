//! Database configuration module for split-buddy.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust models. Tables are created parents first because
//! the split, expense and membership tables carry foreign keys.

use crate::entities::{
    Expense, Friendship, Group, GroupMember, Member, Split, friendship, group_member, split,
};
use crate::errors::Result;
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, Schema,
    sea_query::{Index, IndexCreateStatement},
};
use tracing::{debug, instrument};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/split_buddy.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable or returns
/// the default local `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by [`get_database_url`].
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    debug!("Connecting to database at {database_url}");

    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates all tables that do not exist yet.
#[instrument(skip(db))]
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut statements = [
        schema.create_table_from_entity(Member),
        schema.create_table_from_entity(Group),
        schema.create_table_from_entity(GroupMember),
        schema.create_table_from_entity(Expense),
        schema.create_table_from_entity(Split),
        schema.create_table_from_entity(Friendship),
    ];

    for statement in &mut statements {
        let statement = statement.if_not_exists();
        db.execute(builder.build(&*statement)).await?;
    }

    for index in unique_indexes() {
        db.execute(builder.build(&index)).await?;
    }

    debug!("Ledger tables are in place");
    Ok(())
}

/// One split per (expense, member), one membership per (group, member) and one
/// friendship per (member, friend).
fn unique_indexes() -> [IndexCreateStatement; 3] {
    [
        Index::create()
            .name("idx_expense_splits_expense_member")
            .table(Split)
            .col(split::Column::ExpenseId)
            .col(split::Column::MemberId)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_group_members_group_member")
            .table(GroupMember)
            .col(group_member::Column::GroupId)
            .col(group_member::Column::MemberId)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_friendships_member_friend")
            .table(Friendship)
            .col(friendship::Column::MemberId)
            .col(friendship::Column::FriendId)
            .unique()
            .if_not_exists()
            .to_owned(),
    ]
}
