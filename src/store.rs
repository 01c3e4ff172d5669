//! Persistence collaborator used by the balance service.
//!
//! The ledger engine only ever reads expenses, splits and members. [`LedgerStore`]
//! captures exactly those reads so the balance service can run against the
//! `SeaORM` database in production and against in-memory fixtures in tests.

use crate::{
    core::{
        expense::{get_expenses_for_group, get_splits_for_expense},
        group::get_group_members,
        model::{Expense, ExpenseId, GroupId, Member, Split},
    },
    errors::Result,
};
use sea_orm::DatabaseConnection;

/// Read access to the persisted ledger records.
pub trait LedgerStore: Send + Sync {
    /// All expenses recorded in a group.
    fn fetch_group_expenses(
        &self,
        group_id: GroupId,
    ) -> impl Future<Output = Result<Vec<Expense>>> + Send;

    /// All splits of one expense, settled or not.
    fn fetch_splits_for_expense(
        &self,
        expense_id: ExpenseId,
    ) -> impl Future<Output = Result<Vec<Split>>> + Send;

    /// Current members of a group.
    fn fetch_group_members(
        &self,
        group_id: GroupId,
    ) -> impl Future<Output = Result<Vec<Member>>> + Send;
}

/// [`LedgerStore`] backed by a `SeaORM` connection.
#[derive(Debug)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl LedgerStore for SeaOrmStore {
    async fn fetch_group_expenses(&self, group_id: GroupId) -> Result<Vec<Expense>> {
        get_expenses_for_group(&self.db, group_id).await
    }

    async fn fetch_splits_for_expense(&self, expense_id: ExpenseId) -> Result<Vec<Split>> {
        get_splits_for_expense(&self.db, expense_id).await
    }

    async fn fetch_group_members(&self, group_id: GroupId) -> Result<Vec<Member>> {
        get_group_members(&self.db, group_id).await
    }
}
