use sea_orm::{DatabaseTransaction, TransactionTrait};

use crate::{Currency, ResultEngine, RoomSummary, rooms, summarize};

use super::{Engine, with_tx};

impl Engine {
    /// Balances and suggested transfers of a room, recomputed from its
    /// stored expenses on every call.
    pub async fn room_summary(&self, room_id: &str, user_id: &str) -> ResultEngine<RoomSummary> {
        with_tx!(self, |db_tx| {
            let membership = self.require_member(&db_tx, room_id, user_id).await?;
            self.summary_in(&db_tx, &membership.room).await
        })
    }

    /// Summary as seen from inside `db`, including its uncommitted writes.
    pub(super) async fn summary_in(
        &self,
        db: &DatabaseTransaction,
        room: &rooms::Model,
    ) -> ResultEngine<RoomSummary> {
        let expenses = self.list_active_expenses(db, &room.id).await?;
        let members = self.room_member_ids(db, &room.id).await?;
        let currency = Currency::parse(&room.currency)?;
        tracing::debug!(
            room_id = %room.id,
            expenses = expenses.len(),
            members = members.len(),
            "recomputing room summary"
        );
        Ok(summarize(&room.id, currency, &expenses, members))
    }
}
