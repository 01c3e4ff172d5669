//! Ledger aggregation - derives who owes whom from expenses and their splits.
//!
//! Balances are never stored. They are recomputed from the unsettled splits every
//! time, so the persisted splits stay the single source of truth.

use super::{
    model::{ExpenseWithSplits, MemberId},
    money::Money,
};
use crate::errors::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// Outstanding position of one member.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MemberBalance {
    /// Netted amount this member owes each counterparty
    pub owes: BTreeMap<MemberId, Money>,
    /// Owed to the member minus owed by the member
    pub net_balance: Money,
}

/// A netted debt between two members.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Debt {
    pub debtor: MemberId,
    pub creditor: MemberId,
    pub amount: Money,
}

/// Balances of every member that appears in the aggregated expenses.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LedgerSummary {
    pub members: BTreeMap<MemberId, MemberBalance>,
}

impl LedgerSummary {
    /// Balance of a single member, if they appear in the ledger.
    #[must_use]
    pub fn member(&self, member: MemberId) -> Option<&MemberBalance> {
        self.members.get(&member)
    }

    /// Net balance of a member, zero for members not in the ledger.
    #[must_use]
    pub fn net_balance(&self, member: MemberId) -> Money {
        self.members
            .get(&member)
            .map_or(Money::ZERO, |balance| balance.net_balance)
    }

    /// Member to net balance map, the input of the settlement planner.
    #[must_use]
    pub fn net_balances(&self) -> BTreeMap<MemberId, Money> {
        self.members
            .iter()
            .map(|(&member, balance)| (member, balance.net_balance))
            .collect()
    }

    /// Every netted pairwise debt, ordered by debtor then creditor.
    #[must_use]
    pub fn debts(&self) -> Vec<Debt> {
        self.members
            .iter()
            .flat_map(|(&debtor, balance)| {
                balance.owes.iter().map(move |(&creditor, &amount)| Debt {
                    debtor,
                    creditor,
                    amount,
                })
            })
            .collect()
    }

    /// Amount `debtor` owes `creditor` after netting, zero if nothing is owed.
    #[must_use]
    pub fn owed_between(&self, debtor: MemberId, creditor: MemberId) -> Money {
        self.members
            .get(&debtor)
            .and_then(|balance| balance.owes.get(&creditor))
            .copied()
            .unwrap_or(Money::ZERO)
    }
}

/// Aggregates expenses into netted pairwise debts and per-member net balances.
///
/// Every unsettled split whose member is not the payer adds to "member owes payer".
/// Amounts are summed per unordered pair first, so two members owing each other
/// collapse into a single debt in the net direction and pairs that cancel out are
/// dropped. The result does not depend on the order of `expenses`.
///
/// # Errors
/// [`Error::AmountOverflow`] if a running total leaves the range of 64-bit minor
/// units.
pub fn aggregate(expenses: &[ExpenseWithSplits]) -> Result<LedgerSummary> {
    // (low, high) -> amount low owes high; negative means high owes low
    let mut pairs: BTreeMap<(MemberId, MemberId), Money> = BTreeMap::new();
    let mut members: BTreeMap<MemberId, MemberBalance> = BTreeMap::new();

    for record in expenses {
        let payer = record.expense.paid_by;
        members.entry(payer).or_default();
        for split in &record.splits {
            members.entry(split.member_id).or_default();
        }

        for split in record.unsettled_splits() {
            if split.member_id == payer {
                continue;
            }

            let (key, amount) = if split.member_id < payer {
                ((split.member_id, payer), Some(split.amount))
            } else {
                ((payer, split.member_id), split.amount.checked_neg())
            };
            let entry = pairs.entry(key).or_default();
            let running = *entry;
            *entry = amount
                .and_then(|amount| running.checked_add(amount))
                .ok_or_else(overflow)?;
        }
    }

    for ((low, high), amount) in pairs {
        if amount.is_zero() {
            continue;
        }

        let (debtor, creditor, owed) = if amount.is_positive() {
            (low, high, amount)
        } else {
            (high, low, amount.checked_neg().ok_or_else(overflow)?)
        };

        let debtor_balance = members.entry(debtor).or_default();
        debtor_balance.owes.insert(creditor, owed);
        debtor_balance.net_balance = debtor_balance
            .net_balance
            .checked_sub(owed)
            .ok_or_else(overflow)?;

        let creditor_balance = members.entry(creditor).or_default();
        creditor_balance.net_balance = creditor_balance
            .net_balance
            .checked_add(owed)
            .ok_or_else(overflow)?;
    }

    Ok(LedgerSummary { members })
}

fn overflow() -> Error {
    Error::AmountOverflow {
        operation: "aggregating balances",
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::model::{Expense, ExpenseCategory, ExpenseId, GroupId, Split, SplitId};
    use chrono::Utc;

    const A: MemberId = MemberId(1);
    const B: MemberId = MemberId(2);
    const C: MemberId = MemberId(3);
    const D: MemberId = MemberId(4);

    fn expense(id: i64, paid_by: MemberId, shares: &[(MemberId, i64)]) -> ExpenseWithSplits {
        let amount: i64 = shares.iter().map(|(_, share)| share).sum();
        ExpenseWithSplits {
            expense: Expense {
                id: ExpenseId(id),
                group_id: GroupId(1),
                paid_by,
                amount: Money::from_minor(amount),
                currency: "INR".to_string(),
                description: format!("Expense {id}"),
                category: ExpenseCategory::Other,
                created_at: Utc::now(),
            },
            splits: shares
                .iter()
                .enumerate()
                .map(|(idx, &(member_id, share))| Split {
                    id: SplitId(id * 100 + i64::try_from(idx).unwrap_or_default()),
                    expense_id: ExpenseId(id),
                    member_id,
                    amount: Money::from_minor(share),
                    is_settled: false,
                    settled_at: None,
                })
                .collect(),
        }
    }

    #[test]
    fn test_single_expense_equal_split() {
        let expenses = [expense(1, A, &[(A, 300), (B, 300), (C, 300), (D, 300)])];
        let summary = aggregate(&expenses).unwrap();

        assert_eq!(summary.net_balance(A), Money::from_minor(900));
        for member in [B, C, D] {
            assert_eq!(summary.net_balance(member), Money::from_minor(-300));
            assert_eq!(summary.owed_between(member, A), Money::from_minor(300));
        }
        assert!(summary.member(A).is_some_and(|balance| balance.owes.is_empty()));
    }

    #[test]
    fn test_opposite_debts_are_netted() {
        let expenses = [
            expense(1, A, &[(A, 50), (B, 50)]),
            expense(2, B, &[(A, 30), (B, 30)]),
        ];
        let summary = aggregate(&expenses).unwrap();

        assert_eq!(summary.owed_between(B, A), Money::from_minor(20));
        assert_eq!(summary.owed_between(A, B), Money::ZERO);
        assert_eq!(
            summary.debts(),
            vec![Debt {
                debtor: B,
                creditor: A,
                amount: Money::from_minor(20)
            }]
        );
    }

    #[test]
    fn test_pair_netting_to_zero_is_omitted() {
        let expenses = [
            expense(1, A, &[(A, 40), (B, 40)]),
            expense(2, B, &[(A, 40), (B, 40)]),
        ];
        let summary = aggregate(&expenses).unwrap();

        assert!(summary.debts().is_empty());
        assert_eq!(summary.net_balance(A), Money::ZERO);
        assert_eq!(summary.net_balance(B), Money::ZERO);
        // Both members still show up in the summary
        assert_eq!(summary.members.len(), 2);
    }

    #[test]
    fn test_settled_splits_are_excluded() {
        let mut settled = expense(1, A, &[(A, 100), (B, 100), (C, 100)]);
        let unsettled = settled.clone();
        settled.splits[1].is_settled = true;
        settled.splits[1].settled_at = Some(Utc::now());

        let before = aggregate(&[unsettled]).unwrap();
        let after = aggregate(&[settled]).unwrap();

        assert_ne!(before, after);
        assert_eq!(after.owed_between(B, A), Money::ZERO);
        assert_eq!(after.net_balance(B), Money::ZERO);
        assert_eq!(after.net_balance(A), Money::from_minor(100));
        assert_eq!(before.net_balance(A), Money::from_minor(200));
    }

    #[test]
    fn test_order_independent() {
        let first = expense(1, A, &[(A, 10), (B, 20), (C, 30)]);
        let second = expense(2, C, &[(A, 25), (D, 25)]);
        let third = expense(3, B, &[(C, 7), (D, 3)]);

        let forward = aggregate(&[first.clone(), second.clone(), third.clone()]).unwrap();
        let backward = aggregate(&[third, second, first]).unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_net_balances_sum_to_zero() {
        let expenses = [
            expense(1, A, &[(A, 10), (B, 20), (C, 30)]),
            expense(2, C, &[(A, 25), (D, 25)]),
            expense(3, B, &[(C, 7), (D, 3)]),
        ];
        let summary = aggregate(&expenses).unwrap();
        let total: Money = summary.net_balances().values().sum();
        assert_eq!(total, Money::ZERO);
    }

    #[test]
    fn test_overflowing_totals_are_reported() {
        let expenses = [
            expense(1, A, &[(B, i64::MAX)]),
            expense(2, A, &[(B, 1)]),
        ];
        assert!(matches!(
            aggregate(&expenses),
            Err(Error::AmountOverflow { .. })
        ));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(aggregate(&[]).unwrap(), LedgerSummary::default());
    }
}
