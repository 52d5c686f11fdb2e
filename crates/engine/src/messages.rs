//! Room chat transcript.
//!
//! Members post `text` messages; room and expense operations post `system`
//! messages (e.g. "alice added: Dinner (90.00 MAD)").

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    System,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::System => "system",
        }
    }
}

impl TryFrom<&str> for MessageKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "text" => Ok(Self::Text),
            "system" => Ok(Self::System),
            other => Err(EngineError::InvalidId(format!(
                "invalid message kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub room_id: String,
    pub sender_id: Option<String>,
    pub body: String,
    pub kind: MessageKind,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub(crate) fn text(room_id: &str, sender_id: &str, body: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            room_id: room_id.to_string(),
            sender_id: Some(sender_id.to_string()),
            body,
            kind: MessageKind::Text,
            created_at: Utc::now(),
        }
    }

    pub(crate) fn system(room_id: &str, body: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            room_id: room_id.to_string(),
            sender_id: None,
            body,
            kind: MessageKind::System,
            created_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "messages")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub room_id: String,
    pub sender_id: Option<String>,
    pub body: String,
    pub kind: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::rooms::Entity",
        from = "Column::RoomId",
        to = "super::rooms::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Rooms,
}

impl Related<super::rooms::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rooms.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Message> for ActiveModel {
    fn from(message: &Message) -> Self {
        Self {
            id: ActiveValue::Set(message.id.to_string()),
            room_id: ActiveValue::Set(message.room_id.clone()),
            sender_id: ActiveValue::Set(message.sender_id.clone()),
            body: ActiveValue::Set(message.body.clone()),
            kind: ActiveValue::Set(message.kind.as_str().to_string()),
            created_at: ActiveValue::Set(message.created_at),
        }
    }
}

impl TryFrom<Model> for Message {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::InvalidId("invalid message id".to_string()))?,
            room_id: model.room_id,
            sender_id: model.sender_id,
            body: model.body,
            kind: MessageKind::try_from(model.kind.as_str())?,
            created_at: model.created_at,
        })
    }
}
