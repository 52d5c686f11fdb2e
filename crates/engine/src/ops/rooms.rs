use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    EngineError, LedgerEvent, MemberRole, NewRoom, ResultEngine, Room, RoomDetail,
    RoomMember, room_members, rooms,
    util::{new_invite_code, normalize_invite_code, normalize_optional_text, normalize_text},
};

use super::{Engine, with_tx};

/// Fresh codes tried before giving up on a collision streak.
const INVITE_CODE_ATTEMPTS: usize = 8;

impl Engine {
    /// Create a room; the creator becomes its admin.
    pub async fn create_room(&self, new_room: NewRoom, user_id: &str) -> ResultEngine<Room> {
        let name = normalize_text(&new_room.name, "room name", 2, 60)?;
        let description = normalize_optional_text(new_room.description.as_deref(), "description", 200)?;

        let (room, message) = with_tx!(self, |db_tx| {
            self.require_user_exists(&db_tx, user_id).await?;

            let mut invite_code = None;
            for _ in 0..INVITE_CODE_ATTEMPTS {
                let code = new_invite_code();
                let taken = rooms::Entity::find()
                    .filter(rooms::Column::InviteCode.eq(code.clone()))
                    .one(&db_tx)
                    .await?
                    .is_some();
                if !taken {
                    invite_code = Some(code);
                    break;
                }
            }
            let invite_code = invite_code.ok_or_else(|| {
                EngineError::ExistingKey("could not allocate an invite code".to_string())
            })?;

            let room = Room {
                id: Uuid::new_v4().to_string(),
                name,
                description,
                kind: new_room.kind.unwrap_or_default(),
                currency: new_room.currency.unwrap_or_default(),
                invite_code,
                created_by: user_id.to_string(),
                archived: false,
                created_at: Utc::now(),
            };
            rooms::ActiveModel::from(&room).insert(&db_tx).await?;
            self.insert_member(&db_tx, &room.id, user_id, MemberRole::Admin)
                .await?;
            let message = self
                .insert_system_message(&db_tx, &room.id, format!("{user_id} created the room."))
                .await?;
            Ok((room, message))
        })?;

        tracing::info!(room_id = %room.id, user_id, "room created");
        self.notifier
            .publish(&room.id, LedgerEvent::NewMessage(message));
        Ok(room)
    }

    /// Join a room through its invite code. Joining twice is a no-op.
    pub async fn join_room(&self, invite_code: &str, user_id: &str) -> ResultEngine<Room> {
        let invite_code = normalize_invite_code(invite_code)?;

        let (room, message) = with_tx!(self, |db_tx| {
            self.require_user_exists(&db_tx, user_id).await?;
            let model = rooms::Entity::find()
                .filter(rooms::Column::InviteCode.eq(invite_code.clone()))
                .filter(rooms::Column::Archived.eq(false))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("room not exists".to_string()))?;

            let message = if self.member_role(&db_tx, &model.id, user_id).await?.is_some() {
                None
            } else {
                self.insert_member(&db_tx, &model.id, user_id, MemberRole::Member)
                    .await?;
                let body = format!("{user_id} joined the room.");
                Some(self.insert_system_message(&db_tx, &model.id, body).await?)
            };
            Ok((Room::try_from(model)?, message))
        })?;

        if let Some(message) = message {
            tracing::info!(room_id = %room.id, user_id, "member joined");
            self.notifier
                .publish(&room.id, LedgerEvent::NewMessage(message));
        }
        Ok(room)
    }

    /// Non-archived rooms `user_id` belongs to, newest first.
    pub async fn list_rooms(&self, user_id: &str) -> ResultEngine<Vec<Room>> {
        with_tx!(self, |db_tx| {
            let room_ids: Vec<String> = room_members::Entity::find()
                .filter(room_members::Column::UserId.eq(user_id.to_string()))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|m| m.room_id)
                .collect();
            rooms::Entity::find()
                .filter(rooms::Column::Id.is_in(room_ids))
                .filter(rooms::Column::Archived.eq(false))
                .order_by_desc(rooms::Column::CreatedAt)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Room::try_from)
                .collect()
        })
    }

    /// A room and its roster.
    pub async fn room(&self, room_id: &str, user_id: &str) -> ResultEngine<RoomDetail> {
        with_tx!(self, |db_tx| {
            let membership = self.require_member(&db_tx, room_id, user_id).await?;
            let members = room_members::Entity::find()
                .filter(room_members::Column::RoomId.eq(room_id.to_string()))
                .order_by_asc(room_members::Column::JoinedAt)
                .order_by_asc(room_members::Column::UserId)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(RoomMember::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;
            Ok(RoomDetail {
                room: Room::try_from(membership.room)?,
                members,
            })
        })
    }

    async fn insert_member(
        &self,
        db: &DatabaseTransaction,
        room_id: &str,
        user_id: &str,
        role: MemberRole,
    ) -> ResultEngine<()> {
        room_members::ActiveModel {
            room_id: ActiveValue::Set(room_id.to_string()),
            user_id: ActiveValue::Set(user_id.to_string()),
            role: ActiveValue::Set(role.as_str().to_string()),
            joined_at: ActiveValue::Set(Utc::now()),
        }
        .insert(db)
        .await?;
        Ok(())
    }
}
