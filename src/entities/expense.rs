//! Expense entity - A single payment made by one member on behalf of a group.
//!
//! Amounts are stored as whole minor units (`amount_minor`) so no rounding happens
//! in the database. The `category` column holds the snake_case category name.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Expense database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    /// Unique identifier for the expense
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Group the expense was recorded in
    pub group_id: i64,
    /// Member who paid
    pub paid_by: i64,
    /// Amount paid, in minor currency units (always positive)
    pub amount_minor: i64,
    /// ISO currency code (e.g., `"INR"`)
    pub currency: String,
    /// What the expense was for
    pub description: String,
    /// Category name: `"food"`, `"groceries"`, `"rent"`, ...
    pub category: String,
    /// When the expense was recorded
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Expense and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each expense belongs to one group
    #[sea_orm(
        belongs_to = "super::group::Entity",
        from = "Column::GroupId",
        to = "super::group::Column::Id"
    )]
    Group,
    /// One expense has many splits
    #[sea_orm(has_many = "super::split::Entity")]
    Splits,
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl Related<super::split::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Splits.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
