//! Report generation business logic.
//!
//! Turns ledger summaries into viewer-centric figures ("you owe", "you are owed",
//! per-group position) and formats amounts, debts and payments for display. All
//! functions are pure and framework-agnostic.

use super::{
    ledger::{Debt, LedgerSummary},
    model::{Member, MemberId},
    money::Money,
    settlement::Payment,
};
use crate::config::ledger::CurrencyConfig;
use std::collections::{BTreeMap, BTreeSet};

/// A member's overall position across one or more groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberSummary {
    /// The member the summary is for
    pub member: MemberId,
    /// Owed to the member minus owed by the member
    pub net_balance: Money,
    /// Total the member owes others
    pub total_owed: Money,
    /// Distinct people the member owes money to
    pub creditor_count: usize,
    /// Total others owe the member
    pub total_owed_to: Money,
    /// Distinct people who owe the member money
    pub debtor_count: usize,
}

/// Where a member stands within a single group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupPosition {
    /// Others owe the member this much
    Owed(Money),
    /// The member owes this much
    Owes(Money),
    SettledUp,
}

/// Builds a member's summary over several group ledgers.
///
/// Debts are not netted across groups: owing someone in one group and being owed
/// by them in another shows up on both sides. Totals saturate at the `i64` bounds.
#[must_use]
pub fn member_summary(ledgers: &[LedgerSummary], member: MemberId) -> MemberSummary {
    let mut total_owed = Money::ZERO;
    let mut total_owed_to = Money::ZERO;
    let mut creditors = BTreeSet::new();
    let mut debtors = BTreeSet::new();

    for ledger in ledgers {
        for debt in ledger.debts() {
            if debt.debtor == member {
                total_owed = total_owed.saturating_add(debt.amount);
                creditors.insert(debt.creditor);
            } else if debt.creditor == member {
                total_owed_to = total_owed_to.saturating_add(debt.amount);
                debtors.insert(debt.debtor);
            }
        }
    }

    MemberSummary {
        member,
        net_balance: total_owed_to.saturating_sub(total_owed),
        total_owed,
        creditor_count: creditors.len(),
        total_owed_to,
        debtor_count: debtors.len(),
    }
}

/// Where `member` stands in one group's ledger.
#[must_use]
pub fn group_position(ledger: &LedgerSummary, member: MemberId) -> GroupPosition {
    let balance = ledger.net_balance(member);
    if balance.is_positive() {
        GroupPosition::Owed(balance)
    } else if balance.is_negative() {
        GroupPosition::Owes(balance.abs())
    } else {
        GroupPosition::SettledUp
    }
}

/// Formats an amount like "₹1200.00" or "-₹25.50".
#[must_use]
pub fn format_money(amount: Money, currency: &CurrencyConfig) -> String {
    let value = amount.abs().to_decimal(currency.minor_unit_digits);
    let sign = if amount.is_negative() { "-" } else { "" };
    format!("{sign}{}{value}", currency.symbol)
}

/// Formats a balance with an explicit sign, like "+₹50.00" or "-₹25.50".
#[must_use]
pub fn format_signed_money(amount: Money, currency: &CurrencyConfig) -> String {
    if amount.is_negative() {
        format_money(amount, currency)
    } else {
        format!("+{}", format_money(amount, currency))
    }
}

/// Display name lookup for a group's members.
#[must_use]
pub fn member_names(members: &[Member]) -> BTreeMap<MemberId, String> {
    members
        .iter()
        .map(|member| (member.id, member.display_name.clone()))
        .collect()
}

fn name_of(names: &BTreeMap<MemberId, String>, member: MemberId) -> String {
    names
        .get(&member)
        .cloned()
        .unwrap_or_else(|| format!("member #{member}"))
}

/// "Rahul owes Priya ₹300.00"
#[must_use]
pub fn format_debt(
    debt: &Debt,
    names: &BTreeMap<MemberId, String>,
    currency: &CurrencyConfig,
) -> String {
    format!(
        "{} owes {} {}",
        name_of(names, debt.debtor),
        name_of(names, debt.creditor),
        format_money(debt.amount, currency)
    )
}

/// "Rahul pays Priya ₹300.00"
#[must_use]
pub fn format_payment(
    payment: &Payment,
    names: &BTreeMap<MemberId, String>,
    currency: &CurrencyConfig,
) -> String {
    format!(
        "{} pays {} {}",
        name_of(names, payment.from),
        name_of(names, payment.to),
        format_money(payment.amount, currency)
    )
}

/// One line per member: name, signed balance and a short verdict.
#[must_use]
pub fn format_balance_lines(
    ledger: &LedgerSummary,
    names: &BTreeMap<MemberId, String>,
    currency: &CurrencyConfig,
) -> Vec<String> {
    ledger
        .members
        .keys()
        .map(|&member| {
            let verdict = match group_position(ledger, member) {
                GroupPosition::Owed(_) => "is owed",
                GroupPosition::Owes(_) => "owes",
                GroupPosition::SettledUp => "settled up",
            };
            format!(
                "{} | {} | {verdict}",
                name_of(names, member),
                format_signed_money(ledger.net_balance(member), currency)
            )
        })
        .collect()
}
