//! Plain domain records consumed by the ledger engine.
//!
//! These mirror the persisted rows but carry typed ids and [`Money`] amounts, so the
//! allocation, aggregation and settlement code never touches database models.

use super::money::Money;
use crate::entities::{expense, group, member, split};
use crate::errors::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Identifier of a person taking part in one or more groups
    MemberId
);
id_type!(
    /// Identifier of a group
    GroupId
);
id_type!(
    /// Identifier of an expense
    ExpenseId
);
id_type!(
    /// Identifier of a single member's split of an expense
    SplitId
);

/// A person participating in groups.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub display_name: String,
}

/// A named collection of members sharing expenses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub description: Option<String>,
    pub created_by: MemberId,
    pub created_at: DateTime<Utc>,
}

/// What an expense was spent on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    Food,
    Groceries,
    Rent,
    Transport,
    Entertainment,
    Fuel,
    Coffee,
    Other,
}

impl ExpenseCategory {
    /// Stored representation of the category
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Groceries => "groceries",
            Self::Rent => "rent",
            Self::Transport => "transport",
            Self::Entertainment => "entertainment",
            Self::Fuel => "fuel",
            Self::Coffee => "coffee",
            Self::Other => "other",
        }
    }

    /// Human-readable label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Food => "Food & Dining",
            Self::Groceries => "Groceries",
            Self::Rent => "Rent & Utilities",
            Self::Transport => "Transport",
            Self::Entertainment => "Entertainment",
            Self::Fuel => "Fuel",
            Self::Coffee => "Coffee & Drinks",
            Self::Other => "Other",
        }
    }
}

impl From<&str> for ExpenseCategory {
    /// Unknown or legacy category strings fall back to [`ExpenseCategory::Other`].
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "food" => Self::Food,
            "groceries" => Self::Groceries,
            "rent" => Self::Rent,
            "transport" => Self::Transport,
            "entertainment" => Self::Entertainment,
            "fuel" => Self::Fuel,
            "coffee" => Self::Coffee,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single payment event inside a group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub group_id: GroupId,
    /// Member who paid the full amount
    pub paid_by: MemberId,
    /// Always positive
    pub amount: Money,
    pub currency: String,
    pub description: String,
    pub category: ExpenseCategory,
    pub created_at: DateTime<Utc>,
}

/// One member's share of one expense.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub id: SplitId,
    pub expense_id: ExpenseId,
    pub member_id: MemberId,
    /// Owed amount, never negative
    pub amount: Money,
    pub is_settled: bool,
    /// Present only when `is_settled` is true
    pub settled_at: Option<DateTime<Utc>>,
}

/// An expense together with all of its splits, the unit of input for aggregation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseWithSplits {
    pub expense: Expense,
    pub splits: Vec<Split>,
}

impl ExpenseWithSplits {
    /// Checks the per-expense split invariants: one split per member, and split
    /// amounts adding up exactly to the expense amount.
    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for split in &self.splits {
            if !seen.insert(split.member_id) {
                return Err(Error::DuplicateParticipant {
                    member: split.member_id,
                });
            }
        }

        let splits = Money::checked_sum(self.splits.iter().map(|split| split.amount)).ok_or(
            Error::AmountOverflow {
                operation: "summing the splits of an expense",
            },
        )?;
        if splits != self.expense.amount {
            return Err(Error::SplitSumMismatch {
                expense: self.expense.id,
                amount: self.expense.amount,
                splits,
            });
        }

        Ok(())
    }

    /// Splits that still count towards balances.
    pub fn unsettled_splits(&self) -> impl Iterator<Item = &Split> {
        self.splits.iter().filter(|split| !split.is_settled)
    }
}

impl From<member::Model> for Member {
    fn from(model: member::Model) -> Self {
        Self {
            id: MemberId(model.id),
            display_name: model.display_name,
        }
    }
}

impl From<group::Model> for Group {
    fn from(model: group::Model) -> Self {
        Self {
            id: GroupId(model.id),
            name: model.name,
            description: model.description,
            created_by: MemberId(model.created_by),
            created_at: model.created_at,
        }
    }
}

impl From<expense::Model> for Expense {
    fn from(model: expense::Model) -> Self {
        Self {
            id: ExpenseId(model.id),
            group_id: GroupId(model.group_id),
            paid_by: MemberId(model.paid_by),
            amount: Money::from_minor(model.amount_minor),
            currency: model.currency,
            category: ExpenseCategory::from(model.category.as_str()),
            description: model.description,
            created_at: model.created_at,
        }
    }
}

impl From<split::Model> for Split {
    fn from(model: split::Model) -> Self {
        Self {
            id: SplitId(model.id),
            expense_id: ExpenseId(model.expense_id),
            member_id: MemberId(model.member_id),
            amount: Money::from_minor(model.amount_minor),
            is_settled: model.is_settled,
            settled_at: model.settled_at,
        }
    }
}
