//! Balance service - loads a group's ledger through a [`LedgerStore`] and runs the
//! aggregation and settlement engine over it.

use super::{
    ledger::{LedgerSummary, aggregate},
    model::{ExpenseWithSplits, GroupId, Member},
    settlement::{Payment, plan},
};
use crate::{
    errors::{Error, Result},
    store::LedgerStore,
};
use std::collections::BTreeSet;
use tracing::{debug, instrument, warn};

/// Everything needed to render a group's balances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupBalances {
    pub group_id: GroupId,
    pub members: Vec<Member>,
    pub ledger: LedgerSummary,
    pub settlement: Vec<Payment>,
}

/// A group's members and validated expenses, as read from a [`LedgerStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRecords {
    pub members: Vec<Member>,
    pub expenses: Vec<ExpenseWithSplits>,
}

/// Fetches a group's members and every expense with its splits, and checks them.
///
/// # Errors
/// - [`Error::SplitSumMismatch`] or [`Error::DuplicateParticipant`] if an expense's
///   splits are inconsistent
/// - [`Error::NotAGroupMember`] if a payer or split member is not in the group
#[instrument(skip(store))]
pub async fn load_group_expenses<S: LedgerStore>(
    store: &S,
    group_id: GroupId,
) -> Result<GroupRecords> {
    let members = store.fetch_group_members(group_id).await?;
    let member_ids: BTreeSet<_> = members.iter().map(|member| member.id).collect();

    let expenses = store.fetch_group_expenses(group_id).await?;
    let mut records = Vec::with_capacity(expenses.len());
    for expense in expenses {
        let splits = store.fetch_splits_for_expense(expense.id).await?;
        let record = ExpenseWithSplits { expense, splits };
        record.validate()?;

        let outsider = std::iter::once(record.expense.paid_by)
            .chain(record.splits.iter().map(|split| split.member_id))
            .find(|member| !member_ids.contains(member));
        if let Some(member) = outsider {
            warn!(
                expense_id = %record.expense.id,
                "Expense references member {member} outside group {group_id}"
            );
            return Err(Error::NotAGroupMember {
                member,
                group: group_id,
            });
        }

        records.push(record);
    }

    debug!("Loaded {} expense(s)", records.len());
    Ok(GroupRecords {
        members,
        expenses: records,
    })
}

/// Aggregates a group's balances. Members without any outstanding activity are
/// included with a zero balance.
pub async fn group_ledger<S: LedgerStore>(store: &S, group_id: GroupId) -> Result<LedgerSummary> {
    Ok(group_balances(store, group_id).await?.ledger)
}

/// Plans the payments that settle a group.
///
/// # Errors
/// Besides the loading errors of [`load_group_expenses`], returns
/// [`Error::UnbalancedLedger`] if the aggregated balances do not sum to zero.
pub async fn group_settlement_plan<S: LedgerStore>(
    store: &S,
    group_id: GroupId,
) -> Result<Vec<Payment>> {
    Ok(group_balances(store, group_id).await?.settlement)
}

/// Loads, aggregates and plans a group in one go.
#[instrument(skip(store))]
pub async fn group_balances<S: LedgerStore>(store: &S, group_id: GroupId) -> Result<GroupBalances> {
    let GroupRecords { members, expenses } = load_group_expenses(store, group_id).await?;

    let mut ledger = aggregate(&expenses)?;
    for member in &members {
        ledger.members.entry(member.id).or_default();
    }

    let settlement = plan(&ledger.net_balances())?;
    debug!("Planned {} payment(s)", settlement.len());

    Ok(GroupBalances {
        group_id,
        members,
        ledger,
        settlement,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::{
        expense::{record_expense, settle_between},
        model::MemberId,
        money::Money,
    };
    use crate::store::SeaOrmStore;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_four_way_dinner() -> Result<()> {
        let (db, group, members) = setup_with_group(&["A", "B", "C", "D"]).await?;
        let ids: Vec<MemberId> = members.iter().map(|m| m.id).collect();
        record_expense(&db, new_equal_expense(group.id, ids[0], 1200, &ids)).await?;

        let store = SeaOrmStore::new(db);
        let balances = group_balances(&store, group.id).await?;

        assert_eq!(balances.ledger.net_balance(ids[0]), Money::from_minor(900));
        for &member in &ids[1..] {
            assert_eq!(balances.ledger.net_balance(member), Money::from_minor(-300));
        }

        let payments: Vec<(MemberId, MemberId, i64)> = balances
            .settlement
            .iter()
            .map(|p| (p.from, p.to, p.amount.minor()))
            .collect();
        assert_eq!(
            payments,
            vec![
                (ids[1], ids[0], 300),
                (ids[2], ids[0], 300),
                (ids[3], ids[0], 300)
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_idle_members_are_listed() -> Result<()> {
        let (db, group, members) = setup_with_group(&["A", "B", "C"]).await?;
        record_expense(
            &db,
            new_equal_expense(group.id, members[0].id, 100, &[members[0].id, members[1].id]),
        )
        .await?;

        let ledger = group_ledger(&SeaOrmStore::new(db), group.id).await?;
        assert_eq!(ledger.members.len(), 3);
        assert_eq!(ledger.net_balance(members[2].id), Money::ZERO);
        Ok(())
    }

    #[tokio::test]
    async fn test_settled_pair_drops_out_of_plan() -> Result<()> {
        let (db, group, members) = setup_with_group(&["A", "B", "C"]).await?;
        let ids: Vec<MemberId> = members.iter().map(|m| m.id).collect();
        record_expense(&db, new_equal_expense(group.id, ids[0], 300, &ids)).await?;

        settle_between(&db, group.id, ids[1], ids[0]).await?;

        let plan = group_settlement_plan(&SeaOrmStore::new(db), group.id).await?;
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].from, ids[2]);
        assert_eq!(plan[0].to, ids[0]);
        assert_eq!(plan[0].amount, Money::from_minor(100));
        Ok(())
    }

    #[tokio::test]
    async fn test_split_outside_group_is_reported() {
        let store = MemoryStore::default()
            .with_members(&[1, 2])
            .with_expense(1, 1, &[(1, 50), (3, 50)]);

        let result = group_balances(&store, GroupId(1)).await;
        assert!(matches!(
            result,
            Err(Error::NotAGroupMember { member: MemberId(3), .. })
        ));
    }

    #[tokio::test]
    async fn test_inconsistent_splits_are_reported() {
        let store = MemoryStore::default()
            .with_members(&[1, 2])
            .with_raw_expense(1, 1, 100, &[(1, 50), (2, 40)]);

        let result = group_balances(&store, GroupId(1)).await;
        assert!(matches!(result, Err(Error::SplitSumMismatch { .. })));
    }

    #[tokio::test]
    async fn test_members_are_fetched_once() -> Result<()> {
        let store = MemoryStore::default()
            .with_members(&[1, 2])
            .with_expense(1, 1, &[(1, 50), (2, 50)]);

        let balances = group_balances(&store, GroupId(1)).await?;
        assert_eq!(balances.members.len(), 2);
        assert_eq!(store.member_fetches(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_overflowing_group_is_reported() {
        let store = MemoryStore::default()
            .with_members(&[1, 2])
            .with_expense(1, 1, &[(2, i64::MAX)])
            .with_expense(2, 1, &[(2, 1)]);

        let result = group_balances(&store, GroupId(1)).await;
        assert!(matches!(result, Err(Error::AmountOverflow { .. })));
    }

    #[tokio::test]
    async fn test_empty_group() -> Result<()> {
        let store = MemoryStore::default().with_members(&[1]);
        let balances = group_balances(&store, GroupId(1)).await?;
        assert!(balances.settlement.is_empty());
        assert_eq!(balances.ledger.net_balance(MemberId(1)), Money::ZERO);
        Ok(())
    }
}
