use sea_orm::{
    DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
};

use crate::{LedgerEvent, Message, ResultEngine, messages, util::normalize_text};

use super::{Engine, with_tx};

/// How many messages [`Engine::list_messages`] returns.
const MESSAGE_HISTORY_LIMIT: u64 = 200;
const MESSAGE_MAX_LEN: usize = 500;

impl Engine {
    /// Post a chat message to a room.
    pub async fn post_message(
        &self,
        room_id: &str,
        body: &str,
        user_id: &str,
    ) -> ResultEngine<Message> {
        let body = normalize_text(body, "message", 1, MESSAGE_MAX_LEN)?;
        let message = with_tx!(self, |db_tx| {
            self.require_member(&db_tx, room_id, user_id).await?;
            let message = Message::text(room_id, user_id, body);
            messages::ActiveModel::from(&message).insert(&db_tx).await?;
            Ok(message)
        })?;

        self.notifier
            .publish(room_id, LedgerEvent::NewMessage(message.clone()));
        Ok(message)
    }

    /// The latest messages of a room, oldest first.
    pub async fn list_messages(&self, room_id: &str, user_id: &str) -> ResultEngine<Vec<Message>> {
        with_tx!(self, |db_tx| {
            self.require_member(&db_tx, room_id, user_id).await?;
            let models = messages::Entity::find()
                .filter(messages::Column::RoomId.eq(room_id.to_string()))
                .order_by_desc(messages::Column::CreatedAt)
                .limit(MESSAGE_HISTORY_LIMIT)
                .all(&db_tx)
                .await?;
            let mut out = models
                .into_iter()
                .map(Message::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;
            out.reverse();
            Ok(out)
        })
    }

    pub(super) async fn insert_system_message(
        &self,
        db: &DatabaseTransaction,
        room_id: &str,
        body: String,
    ) -> ResultEngine<Message> {
        let message = Message::system(room_id, body);
        messages::ActiveModel::from(&message).insert(db).await?;
        Ok(message)
    }
}
