//! Expense shares.
//!
//! A [`Share`] is one member's owed portion of one expense. Shares are stored
//! in their own table keyed by `(expense_id, member_id)`, so settling a share
//! is a single-row update that never touches its siblings.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::MoneyCents;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    pub member_id: String,
    pub owed: MoneyCents,
    pub settled: bool,
}

impl Share {
    /// New unsettled share.
    pub fn new(member_id: impl Into<String>, owed: MoneyCents) -> Self {
        Self {
            member_id: member_id.into(),
            owed,
            settled: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "expense_shares")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub expense_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub member_id: String,
    pub position: i32,
    pub owed_minor: i64,
    pub settled: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::expenses::Entity",
        from = "Column::ExpenseId",
        to = "super::expenses::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Expenses,
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn from_share(expense_id: &str, position: usize, share: &Share) -> Self {
        Self {
            expense_id: ActiveValue::Set(expense_id.to_string()),
            member_id: ActiveValue::Set(share.member_id.clone()),
            position: ActiveValue::Set(i32::try_from(position).unwrap_or(i32::MAX)),
            owed_minor: ActiveValue::Set(share.owed.cents()),
            settled: ActiveValue::Set(share.settled),
        }
    }
}

impl From<Model> for Share {
    fn from(model: Model) -> Self {
        Self {
            member_id: model.member_id,
            owed: MoneyCents::new(model.owed_minor),
            settled: model.settled,
        }
    }
}
