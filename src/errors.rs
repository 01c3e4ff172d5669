//! Unified error type for split-buddy.
//!
//! Validation failures from the ledger engine, domain checks performed by the
//! write-side operations, and infrastructure errors all funnel into [`Error`].
//! None of these are transient: retrying with the same input yields the same error.

use crate::core::model::{ExpenseId, GroupId, MemberId, SplitId};
use crate::core::money::Money;
use rust_decimal::Decimal;
use thiserror::Error;

/// All errors produced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// An amount was zero, negative, or not representable in minor units
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: Decimal,
    },

    /// An allocation was requested with no participants
    #[error("Cannot split an expense between zero participants")]
    EmptyParticipants,

    /// A member appeared more than once in a participant list
    #[error("Member {member} appears more than once in the participant list")]
    DuplicateParticipant {
        /// The repeated member
        member: MemberId,
    },

    /// Weights were non-positive or did not match the participants
    #[error("Invalid weights: {message}")]
    InvalidWeights {
        /// What was wrong with the weights
        message: String,
    },

    /// Net balances handed to the settlement planner do not sum to zero
    #[error("Ledger is unbalanced: net balances sum to {total} minor units")]
    UnbalancedLedger {
        /// The non-zero sum of all balances
        total: Money,
    },

    /// A sum or difference of amounts does not fit in 64-bit minor units
    #[error("Amount overflow while {operation}")]
    AmountOverflow {
        /// What was being computed
        operation: &'static str,
    },

    /// Splits of one expense do not add up to its amount
    #[error("Splits of expense {expense} sum to {splits} but the expense amount is {amount}")]
    SplitSumMismatch {
        /// The expense being checked
        expense: ExpenseId,
        /// Expense amount
        amount: Money,
        /// Sum of its splits
        splits: Money,
    },

    #[error("Group not found: {group}")]
    GroupNotFound { group: GroupId },

    #[error("Member not found: {member}")]
    MemberNotFound { member: MemberId },

    #[error("Split not found: {split}")]
    SplitNotFound { split: SplitId },

    /// A member was used in a group they do not belong to
    #[error("Member {member} is not part of group {group}")]
    NotAGroupMember {
        /// Offending member
        member: MemberId,
        /// Group being operated on
        group: GroupId,
    },

    #[error("Split {split} is already settled")]
    SplitAlreadySettled { split: SplitId },

    #[error("Member {member} cannot befriend themselves")]
    CannotFriendSelf { member: MemberId },

    #[error("Member {member} is already friends with {friend}")]
    AlreadyFriends { member: MemberId, friend: MemberId },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Numeric conversion error: {0}")]
    Conversion(#[from] std::num::TryFromIntError),
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
