//! A `Room` is a group of members sharing one expense ledger.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{Currency, EngineError, ValidationError};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomKind {
    Trip,
    Roommates,
    #[default]
    General,
}

impl RoomKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trip => "trip",
            Self::Roommates => "roommates",
            Self::General => "general",
        }
    }
}

impl TryFrom<&str> for RoomKind {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "trip" => Ok(Self::Trip),
            "roommates" => Ok(Self::Roommates),
            "general" => Ok(Self::General),
            other => Err(ValidationError::field(
                "room kind",
                format!("unknown kind {other:?}"),
            )),
        }
    }
}

/// Role of a member inside a room.
///
/// - `admin`: created the room; may settle shares on behalf of others.
/// - `member`: joined through the invite code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Admin,
    Member,
}

impl MemberRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }
}

impl TryFrom<&str> for MemberRole {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            other => Err(EngineError::InvalidId(format!(
                "invalid membership role: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub name: String,
    pub description: String,
    pub kind: RoomKind,
    pub currency: Currency,
    pub invite_code: String,
    pub created_by: String,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomMember {
    pub user_id: String,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

/// A room together with its roster.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomDetail {
    pub room: Room,
    pub members: Vec<RoomMember>,
}

/// Input for [`Engine::create_room`](crate::Engine::create_room).
#[derive(Clone, Debug, Default)]
pub struct NewRoom {
    pub name: String,
    pub description: Option<String>,
    pub kind: Option<RoomKind>,
    pub currency: Option<Currency>,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "rooms")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub description: String,
    pub kind: String,
    pub currency: String,
    #[sea_orm(unique)]
    pub invite_code: String,
    pub created_by: String,
    pub archived: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::room_members::Entity")]
    Members,
    #[sea_orm(has_many = "super::expenses::Entity")]
    Expenses,
}

impl Related<super::room_members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Room> for ActiveModel {
    fn from(room: &Room) -> Self {
        Self {
            id: ActiveValue::Set(room.id.clone()),
            name: ActiveValue::Set(room.name.clone()),
            description: ActiveValue::Set(room.description.clone()),
            kind: ActiveValue::Set(room.kind.as_str().to_string()),
            currency: ActiveValue::Set(room.currency.code().to_string()),
            invite_code: ActiveValue::Set(room.invite_code.clone()),
            created_by: ActiveValue::Set(room.created_by.clone()),
            archived: ActiveValue::Set(room.archived),
            created_at: ActiveValue::Set(room.created_at),
        }
    }
}

impl TryFrom<Model> for Room {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            name: model.name,
            description: model.description,
            kind: RoomKind::try_from(model.kind.as_str())?,
            currency: Currency::parse(&model.currency)?,
            invite_code: model.invite_code,
            created_by: model.created_by,
            archived: model.archived,
            created_at: model.created_at,
        })
    }
}
