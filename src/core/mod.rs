//! Core business logic - the ledger engine and the operations that feed it.
//!
//! The engine itself ([`allocator`], [`ledger`], [`settlement`]) is pure and
//! synchronous. The remaining modules read and write the persisted records.

/// Split allocation with exact minor-unit remainder distribution
pub mod allocator;
/// Loading a group's ledger through a store and running the engine over it
pub mod balance;
/// Recording expenses and settling splits
pub mod expense;
/// Friend lists
pub mod friend;
/// Groups and membership
pub mod group;
/// Pairwise netting and per-member balances
pub mod ledger;
/// Members
pub mod member;
/// Domain records consumed by the engine
pub mod model;
/// Integer money in minor units
pub mod money;
/// Viewer summaries and display formatting
pub mod report;
/// Greedy settlement planning
pub mod settlement;

pub use allocator::allocate;
pub use ledger::{LedgerSummary, MemberBalance, aggregate};
pub use money::Money;
pub use settlement::{Payment, plan};
