//! Expense primitives.
//!
//! An [`Expense`] is paid by one member and owed back through its ordered list
//! of [`Share`]s. Expenses are never physically removed: deleting one sets
//! `deleted`, which drops it from every balance computation.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError, MoneyCents, Share, Split, ValidationError, shares};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Food,
    Transport,
    Accommodation,
    Entertainment,
    Utilities,
    Groceries,
    #[default]
    Other,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Transport => "transport",
            Self::Accommodation => "accommodation",
            Self::Entertainment => "entertainment",
            Self::Utilities => "utilities",
            Self::Groceries => "groceries",
            Self::Other => "other",
        }
    }
}

impl TryFrom<&str> for Category {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "food" => Ok(Self::Food),
            "transport" => Ok(Self::Transport),
            "accommodation" => Ok(Self::Accommodation),
            "entertainment" => Ok(Self::Entertainment),
            "utilities" => Ok(Self::Utilities),
            "groceries" => Ok(Self::Groceries),
            "other" => Ok(Self::Other),
            other => Err(ValidationError::field(
                "category",
                format!("unknown category {other:?}"),
            )),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub room_id: String,
    pub description: String,
    pub category: Category,
    pub paid_by: String,
    pub amount: MoneyCents,
    pub currency: Currency,
    pub shares: Vec<Share>,
    pub date: DateTime<Utc>,
    pub created_by: String,
    pub receipt_url: Option<String>,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl Expense {
    /// Returns the share owed by `member_id`, if any.
    pub fn share(&self, member_id: &str) -> Option<&Share> {
        self.shares.iter().find(|s| s.member_id == member_id)
    }

    /// Returns `true` once every share is settled.
    pub fn is_fully_settled(&self) -> bool {
        self.shares.iter().all(|s| s.settled)
    }
}

/// Input for [`Engine::create_expense`](crate::Engine::create_expense).
#[derive(Clone, Debug)]
pub struct NewExpense {
    pub description: String,
    pub amount: MoneyCents,
    pub category: Option<Category>,
    pub paid_by: String,
    pub date: Option<DateTime<Utc>>,
    pub split: Split,
}

/// Edit of the non-financial fields of an expense. `None` leaves a field
/// untouched.
#[derive(Clone, Debug, Default)]
pub struct ExpenseUpdate {
    pub description: Option<String>,
    pub category: Option<Category>,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub room_id: String,
    pub description: String,
    pub category: String,
    pub paid_by: String,
    pub amount_minor: i64,
    pub currency: String,
    pub date: DateTimeUtc,
    pub created_by: String,
    pub receipt_url: Option<String>,
    pub deleted: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::shares::Entity")]
    Shares,
    #[sea_orm(
        belongs_to = "super::rooms::Entity",
        from = "Column::RoomId",
        to = "super::rooms::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Rooms,
}

impl Related<super::shares::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shares.def()
    }
}

impl Related<super::rooms::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rooms.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Expense> for ActiveModel {
    fn from(expense: &Expense) -> Self {
        Self {
            id: ActiveValue::Set(expense.id.to_string()),
            room_id: ActiveValue::Set(expense.room_id.clone()),
            description: ActiveValue::Set(expense.description.clone()),
            category: ActiveValue::Set(expense.category.as_str().to_string()),
            paid_by: ActiveValue::Set(expense.paid_by.clone()),
            amount_minor: ActiveValue::Set(expense.amount.cents()),
            currency: ActiveValue::Set(expense.currency.code().to_string()),
            date: ActiveValue::Set(expense.date),
            created_by: ActiveValue::Set(expense.created_by.clone()),
            receipt_url: ActiveValue::Set(expense.receipt_url.clone()),
            deleted: ActiveValue::Set(expense.deleted),
            created_at: ActiveValue::Set(expense.created_at),
        }
    }
}

impl TryFrom<(Model, Vec<shares::Model>)> for Expense {
    type Error = EngineError;

    fn try_from((model, mut share_models): (Model, Vec<shares::Model>)) -> Result<Self, Self::Error> {
        share_models.sort_by_key(|s| s.position);
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::InvalidId("invalid expense id".to_string()))?,
            room_id: model.room_id,
            description: model.description,
            category: Category::try_from(model.category.as_str())?,
            paid_by: model.paid_by,
            amount: MoneyCents::new(model.amount_minor),
            currency: Currency::parse(&model.currency)?,
            shares: share_models.into_iter().map(Share::from).collect(),
            date: model.date,
            created_by: model.created_by,
            receipt_url: model.receipt_url,
            deleted: model.deleted,
            created_at: model.created_at,
        })
    }
}
