//! Split entity - One member's share of one expense.
//!
//! `settled_at` is only set once `is_settled` flips to true. Settled splits stay in
//! the table as history but no longer count towards balances.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Expense split database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "expense_splits")]
pub struct Model {
    /// Unique identifier for the split
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Expense this split belongs to
    pub expense_id: i64,
    /// Member who owes this share
    pub member_id: i64,
    /// Owed amount in minor currency units
    pub amount_minor: i64,
    /// Whether the share has been paid back
    pub is_settled: bool,
    /// When the share was paid back
    pub settled_at: Option<DateTimeUtc>,
}

/// Defines relationships between Split and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each split belongs to one expense
    #[sea_orm(
        belongs_to = "super::expense::Entity",
        from = "Column::ExpenseId",
        to = "super::expense::Column::Id"
    )]
    Expense,
}

impl Related<super::expense::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expense.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
