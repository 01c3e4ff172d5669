//! Shared test utilities for split-buddy.
//!
//! This module provides helpers for setting up test databases, creating members and
//! groups with sensible defaults, and an in-memory [`LedgerStore`] for exercising
//! the balance service without a database.

use crate::{
    core::{
        expense::NewExpense,
        group::{add_members, create_group},
        member::create_member,
        model::{
            Expense, ExpenseCategory, ExpenseId, ExpenseWithSplits, Group, GroupId, Member,
            MemberId, Split, SplitId,
        },
        money::Money,
    },
    errors::Result,
    store::LedgerStore,
};
use sea_orm::DatabaseConnection;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a member with the given display name.
pub async fn create_test_member(db: &DatabaseConnection, name: &str) -> Result<Member> {
    create_member(db, name.to_string()).await
}

/// Sets up a database with one group containing a member per name.
///
/// The first name is the group creator and adds everyone else. Returns
/// (db, group, members) with members in the order of `names`.
pub async fn setup_with_group(names: &[&str]) -> Result<(DatabaseConnection, Group, Vec<Member>)> {
    let db = setup_test_db().await?;

    let mut members = Vec::with_capacity(names.len());
    for name in names {
        members.push(create_test_member(&db, name).await?);
    }

    let creator = members.first().map_or(MemberId(0), |member| member.id);
    let group = create_group(&db, "Test Group".to_string(), None, creator).await?;

    let others: Vec<MemberId> = members.iter().skip(1).map(|member| member.id).collect();
    add_members(&db, group.id, &others, creator).await?;

    Ok((db, group, members))
}

/// Builds an equally split expense input.
///
/// # Defaults
/// * `currency`: "INR"
/// * `description`: "Test expense"
/// * `category`: other
#[must_use]
pub fn new_equal_expense(
    group_id: GroupId,
    paid_by: MemberId,
    amount_minor: i64,
    participants: &[MemberId],
) -> NewExpense {
    NewExpense {
        group_id,
        paid_by,
        amount: Money::from_minor(amount_minor),
        currency: "INR".to_string(),
        description: "Test expense".to_string(),
        category: ExpenseCategory::Other,
        participants: participants.to_vec(),
        weights: None,
    }
}

/// In-memory [`LedgerStore`] holding a single group's members and expenses.
#[derive(Debug, Default)]
pub struct MemoryStore {
    members: Vec<Member>,
    expenses: Vec<ExpenseWithSplits>,
    member_fetches: AtomicUsize,
}

impl MemoryStore {
    /// How many times the group members were fetched.
    pub fn member_fetches(&self) -> usize {
        self.member_fetches.load(Ordering::Relaxed)
    }

    /// Adds members by id, named "member N".
    #[must_use]
    pub fn with_members(mut self, ids: &[i64]) -> Self {
        self.members.extend(ids.iter().map(|&id| Member {
            id: MemberId(id),
            display_name: format!("member {id}"),
        }));
        self
    }

    /// Adds an expense in group 1 whose amount is the sum of its splits.
    #[must_use]
    pub fn with_expense(self, id: i64, paid_by: i64, splits: &[(i64, i64)]) -> Self {
        let amount = splits.iter().map(|(_, share)| share).sum();
        self.with_raw_expense(id, paid_by, amount, splits)
    }

    /// Adds an expense in group 1 with an explicit amount, even if the splits
    /// do not add up to it.
    #[must_use]
    pub fn with_raw_expense(
        mut self,
        id: i64,
        paid_by: i64,
        amount: i64,
        splits: &[(i64, i64)],
    ) -> Self {
        let expense_id = ExpenseId(id);
        self.expenses.push(ExpenseWithSplits {
            expense: Expense {
                id: expense_id,
                group_id: GroupId(1),
                paid_by: MemberId(paid_by),
                amount: Money::from_minor(amount),
                currency: "INR".to_string(),
                description: format!("Expense {id}"),
                category: ExpenseCategory::Other,
                created_at: chrono::Utc::now(),
            },
            splits: splits
                .iter()
                .zip(1..)
                .map(|(&(member, share), idx)| Split {
                    id: SplitId(id * 1000 + idx),
                    expense_id,
                    member_id: MemberId(member),
                    amount: Money::from_minor(share),
                    is_settled: false,
                    settled_at: None,
                })
                .collect(),
        });
        self
    }
}

impl LedgerStore for MemoryStore {
    async fn fetch_group_expenses(&self, group_id: GroupId) -> Result<Vec<Expense>> {
        Ok(self
            .expenses
            .iter()
            .filter(|record| record.expense.group_id == group_id)
            .map(|record| record.expense.clone())
            .collect())
    }

    async fn fetch_splits_for_expense(&self, expense_id: ExpenseId) -> Result<Vec<Split>> {
        Ok(self
            .expenses
            .iter()
            .filter(|record| record.expense.id == expense_id)
            .flat_map(|record| record.splits.clone())
            .collect())
    }

    async fn fetch_group_members(&self, _group_id: GroupId) -> Result<Vec<Member>> {
        self.member_fetches.fetch_add(1, Ordering::Relaxed);
        Ok(self.members.clone())
    }
}
