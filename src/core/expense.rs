//! Expense business logic - recording expenses, splitting them, and settling splits.
//!
//! Recording an expense validates the payer and participants against the group's
//! membership, runs the split allocator, and writes the expense together with all of
//! its splits in one database transaction so the splits always add up to the
//! expense amount. Settling never deletes anything: splits are flagged with a
//! timestamp and stay in the history.

use super::{
    allocator::allocate,
    group::{get_group_member_ids, require_group},
    model::{
        Expense, ExpenseCategory, ExpenseId, ExpenseWithSplits, GroupId, MemberId, Split, SplitId,
    },
    money::Money,
};
use crate::{
    entities::{self, expense, group_member, split},
    errors::{Error, Result},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    Condition, PaginatorTrait, QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

/// Input for [`record_expense`].
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub group_id: GroupId,
    pub paid_by: MemberId,
    pub amount: Money,
    pub currency: String,
    pub description: String,
    pub category: ExpenseCategory,
    /// Members sharing the expense; the payer may or may not be one of them
    pub participants: Vec<MemberId>,
    /// Optional weights, one per participant in the same order
    pub weights: Option<Vec<Decimal>>,
}

/// An expense as shown in a member's recent activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentExpense {
    pub expense: Expense,
    pub group_name: String,
    /// Number of members the expense was split between
    pub split_count: usize,
}

/// Records an expense and its splits.
///
/// # Errors
/// - [`Error::Config`] if the description is empty
/// - [`Error::GroupNotFound`] if the group does not exist
/// - [`Error::NotAGroupMember`] if the payer or a participant is outside the group
/// - any allocation error from [`allocate`]
#[instrument(skip(db, new_expense), fields(group_id = %new_expense.group_id))]
pub async fn record_expense(
    db: &DatabaseConnection,
    new_expense: NewExpense,
) -> Result<ExpenseWithSplits> {
    if new_expense.description.trim().is_empty() {
        return Err(Error::Config {
            message: "Expense description cannot be empty".to_string(),
        });
    }

    let shares = allocate(
        new_expense.amount,
        &new_expense.participants,
        new_expense.weights.as_deref(),
    )?;

    let txn = db.begin().await?;
    require_group(&txn, new_expense.group_id).await?;

    let members = get_group_member_ids(&txn, new_expense.group_id).await?;
    let outsider = std::iter::once(&new_expense.paid_by)
        .chain(shares.keys())
        .find(|member| !members.contains(*member));
    if let Some(&member) = outsider {
        return Err(Error::NotAGroupMember {
            member,
            group: new_expense.group_id,
        });
    }

    let expense = expense::ActiveModel {
        group_id: Set(new_expense.group_id.0),
        paid_by: Set(new_expense.paid_by.0),
        amount_minor: Set(new_expense.amount.minor()),
        currency: Set(new_expense.currency),
        description: Set(new_expense.description.trim().to_string()),
        category: Set(new_expense.category.as_str().to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut splits = Vec::with_capacity(shares.len());
    for (member, share) in shares {
        let split = split::ActiveModel {
            expense_id: Set(expense.id),
            member_id: Set(member.0),
            amount_minor: Set(share.minor()),
            is_settled: Set(false),
            settled_at: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        splits.push(Split::from(split));
    }

    txn.commit().await?;

    info!(
        expense_id = expense.id,
        "Recorded expense of {} minor units split {} way(s)",
        expense.amount_minor,
        splits.len()
    );

    Ok(ExpenseWithSplits {
        expense: expense.into(),
        splits,
    })
}

/// Loads one expense together with its splits.
pub async fn get_expense_with_splits(
    db: &DatabaseConnection,
    expense_id: ExpenseId,
) -> Result<Option<ExpenseWithSplits>> {
    let Some(expense) = entities::Expense::find_by_id(expense_id.0).one(db).await? else {
        return Ok(None);
    };

    let splits = get_splits_for_expense(db, expense_id).await?;
    Ok(Some(ExpenseWithSplits {
        expense: expense.into(),
        splits,
    }))
}

/// All expenses of a group, newest first.
pub async fn get_expenses_for_group<C>(db: &C, group_id: GroupId) -> Result<Vec<Expense>>
where
    C: ConnectionTrait,
{
    Ok(entities::Expense::find()
        .filter(expense::Column::GroupId.eq(group_id.0))
        .order_by_desc(expense::Column::CreatedAt)
        .order_by_desc(expense::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect())
}

/// All splits of an expense, ordered by member id.
pub async fn get_splits_for_expense<C>(db: &C, expense_id: ExpenseId) -> Result<Vec<Split>>
where
    C: ConnectionTrait,
{
    Ok(entities::Split::find()
        .filter(split::Column::ExpenseId.eq(expense_id.0))
        .order_by_asc(split::Column::MemberId)
        .all(db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect())
}

/// Most recent expenses across every group the member belongs to, newest first.
pub async fn get_recent_expenses_for_member(
    db: &DatabaseConnection,
    member_id: MemberId,
    limit: u64,
) -> Result<Vec<RecentExpense>> {
    let group_ids: Vec<i64> = entities::GroupMember::find()
        .filter(group_member::Column::MemberId.eq(member_id.0))
        .all(db)
        .await?
        .into_iter()
        .map(|row| row.group_id)
        .collect();

    let rows = entities::Expense::find()
        .filter(expense::Column::GroupId.is_in(group_ids))
        .order_by_desc(expense::Column::CreatedAt)
        .order_by_desc(expense::Column::Id)
        .limit(limit)
        .find_also_related(entities::Group)
        .all(db)
        .await?;

    let mut recent = Vec::with_capacity(rows.len());
    for (expense, group) in rows {
        let split_count = entities::Split::find()
            .filter(split::Column::ExpenseId.eq(expense.id))
            .count(db)
            .await?;
        recent.push(RecentExpense {
            group_name: group.map(|g| g.name).unwrap_or_default(),
            split_count: usize::try_from(split_count)?,
            expense: expense.into(),
        });
    }

    Ok(recent)
}

/// Marks a single split as settled.
///
/// # Errors
/// - [`Error::SplitNotFound`] if the split does not exist
/// - [`Error::SplitAlreadySettled`] if it was settled before
pub async fn settle_split(db: &DatabaseConnection, split_id: SplitId) -> Result<Split> {
    let model = entities::Split::find_by_id(split_id.0)
        .one(db)
        .await?
        .ok_or(Error::SplitNotFound { split: split_id })?;

    if model.is_settled {
        return Err(Error::SplitAlreadySettled { split: split_id });
    }

    let mut active: split::ActiveModel = model.into();
    active.is_settled = Set(true);
    active.settled_at = Set(Some(Utc::now()));
    let updated = active.update(db).await?;

    debug!(split_id = updated.id, "Split settled");
    Ok(updated.into())
}

/// Settles everything outstanding between two members of a group.
///
/// Balances are netted per pair, so one payment of the netted amount clears the
/// splits in both directions: `debtor`'s shares of expenses `creditor` paid for, and
/// `creditor`'s shares of expenses `debtor` paid for. Returns how many splits were
/// marked settled.
///
/// # Errors
/// - [`Error::GroupNotFound`] if the group does not exist
/// - [`Error::NotAGroupMember`] if either member is outside the group
#[instrument(skip(db))]
pub async fn settle_between(
    db: &DatabaseConnection,
    group_id: GroupId,
    debtor: MemberId,
    creditor: MemberId,
) -> Result<u64> {
    let txn = db.begin().await?;
    require_group(&txn, group_id).await?;

    let members = get_group_member_ids(&txn, group_id).await?;
    for member in [debtor, creditor] {
        if !members.contains(&member) {
            return Err(Error::NotAGroupMember {
                member,
                group: group_id,
            });
        }
    }

    let direction = |owing: MemberId, paid_by: MemberId| {
        Condition::all()
            .add(split::Column::MemberId.eq(owing.0))
            .add(expense::Column::PaidBy.eq(paid_by.0))
    };

    let split_ids: Vec<i64> = entities::Split::find()
        .inner_join(entities::Expense)
        .filter(expense::Column::GroupId.eq(group_id.0))
        .filter(split::Column::IsSettled.eq(false))
        .filter(
            Condition::any()
                .add(direction(debtor, creditor))
                .add(direction(creditor, debtor)),
        )
        .all(&txn)
        .await?
        .into_iter()
        .map(|row| row.id)
        .collect();

    if split_ids.is_empty() {
        warn!("Nothing outstanding between members {debtor} and {creditor}");
        return Ok(0);
    }

    let result = entities::Split::update_many()
        .col_expr(split::Column::IsSettled, Expr::value(true))
        .col_expr(split::Column::SettledAt, Expr::value(Some(Utc::now())))
        .filter(split::Column::Id.is_in(split_ids))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    info!("Settled {} split(s)", result.rows_affected);
    Ok(result.rows_affected)
}

/// Groups splits by the member who owes them, for display next to an expense.
#[must_use]
pub fn shares_by_member(record: &ExpenseWithSplits) -> BTreeMap<MemberId, Money> {
    record
        .splits
        .iter()
        .map(|split| (split.member_id, split.amount))
        .collect()
}
