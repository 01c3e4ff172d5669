//! Settlement planning - suggests the payments that bring every balance to zero.
//!
//! The planner greedily matches the largest debtor with the largest creditor. This
//! keeps the number of payments low compared to settling every pairwise debt on its
//! own, although it is not guaranteed to be the absolute minimum.

use super::{model::MemberId, money::Money};
use crate::errors::{Error, Result};
use serde::Serialize;
use std::{
    cmp::Reverse,
    collections::{BTreeMap, BinaryHeap},
};

/// Net balances must sum to exactly this many minor units to be settleable.
pub const BALANCE_TOLERANCE: Money = Money::ZERO;

/// One suggested payment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Payment {
    pub from: MemberId,
    pub to: MemberId,
    pub amount: Money,
}

/// Plans payments that zero out every net balance.
///
/// Members with a negative balance pay, members with a positive balance receive.
/// At each step the debtor and creditor with the largest outstanding magnitude are
/// matched (ties go to the lower member id) and the smaller of the two amounts is
/// paid. Whoever still has something outstanding goes back into the pool.
///
/// # Errors
/// - [`Error::UnbalancedLedger`] if the balances do not sum to zero. That points at
///   corrupt input upstream and is reported rather than corrected.
/// - [`Error::AmountOverflow`] if a debt of exactly `i64::MIN` minor units has to
///   be paid, which no single [`Money`] amount can express.
pub fn plan(balances: &BTreeMap<MemberId, Money>) -> Result<Vec<Payment>> {
    // Summed in 128 bits so large balances that cancel out are not mistaken for
    // an overflow.
    let total: i128 = balances
        .values()
        .map(|balance| i128::from(balance.minor()))
        .sum();
    if total.abs() > i128::from(BALANCE_TOLERANCE.minor()) {
        let clamped = total.clamp(i128::from(i64::MIN), i128::from(i64::MAX));
        return Err(Error::UnbalancedLedger {
            total: Money::from_minor(i64::try_from(clamped)?),
        });
    }

    let mut debtors = BinaryHeap::new();
    let mut creditors = BinaryHeap::new();
    for (&member, &balance) in balances {
        if balance.is_negative() {
            let owed = balance.checked_abs().ok_or(Error::AmountOverflow {
                operation: "planning settlement payments",
            })?;
            debtors.push((owed, Reverse(member)));
        } else if balance.is_positive() {
            creditors.push((balance, Reverse(member)));
        }
    }

    let mut payments = Vec::new();
    while let (Some((owed, Reverse(debtor))), Some((due, Reverse(creditor)))) =
        (debtors.pop(), creditors.pop())
    {
        let amount = owed.min(due);
        payments.push(Payment {
            from: debtor,
            to: creditor,
            amount,
        });

        if owed > amount {
            debtors.push((owed - amount, Reverse(debtor)));
        }
        if due > amount {
            creditors.push((due - amount, Reverse(creditor)));
        }
    }

    debug_assert!(debtors.is_empty() && creditors.is_empty());
    Ok(payments)
}

/// Applies `payments` to `balances`, returning the resulting balances.
///
/// Useful for checking that a plan settles everything. Results saturate at the
/// `i64` bounds.
#[must_use]
pub fn apply_payments(
    balances: &BTreeMap<MemberId, Money>,
    payments: &[Payment],
) -> BTreeMap<MemberId, Money> {
    let mut result = balances.clone();
    for payment in payments {
        let from = result.entry(payment.from).or_default();
        *from = from.saturating_add(payment.amount);
        let to = result.entry(payment.to).or_default();
        *to = to.saturating_sub(payment.amount);
    }
    result
}
