use sea_orm::{DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{
    EngineError, Expense, LedgerEvent, MemberRole, ResultEngine, Settlement,
    settlement::{SettleActor, ensure_can_settle},
    shares,
};

use super::{Engine, with_tx};

impl Engine {
    /// Mark `member`'s share of an expense as settled. `member` defaults to
    /// the acting user.
    ///
    /// Settling an already settled share succeeds with
    /// [`Settlement::AlreadySettled`] and publishes nothing.
    pub async fn settle_share(
        &self,
        expense_id: Uuid,
        member: Option<&str>,
        user_id: &str,
    ) -> ResultEngine<(Settlement, Expense)> {
        let member_id = member.unwrap_or(user_id);

        let (settlement, expense, events) = with_tx!(self, |db_tx| {
            let model = self.require_expense(&db_tx, expense_id).await?;
            let membership = self.require_member(&db_tx, &model.room_id, user_id).await?;
            ensure_can_settle(
                SettleActor {
                    user_id,
                    is_admin: membership.role == MemberRole::Admin,
                },
                member_id,
                &model.paid_by,
            )?;

            let settlement = self.update_share(&db_tx, expense_id, member_id).await?;
            let expense = self.load_expense(&db_tx, model).await?;

            let mut events = Vec::new();
            if settlement.changed() {
                let body = if member_id == user_id {
                    format!("{user_id} marked a share as settled.")
                } else {
                    format!("{user_id} marked {member_id}'s share as settled.")
                };
                let message = self
                    .insert_system_message(&db_tx, &expense.room_id, body)
                    .await?;
                let summary = self.summary_in(&db_tx, &membership.room).await?;
                events.push(LedgerEvent::ExpenseUpdated(expense.clone()));
                events.push(LedgerEvent::NewMessage(message));
                events.push(LedgerEvent::SummaryUpdated(summary));
            }
            Ok((settlement, expense, events))
        })?;

        tracing::info!(
            %expense_id,
            member_id,
            changed = settlement.changed(),
            "share settle requested"
        );
        self.publish_all(&expense.room_id, events);
        Ok((settlement, expense))
    }

    /// Settle one share row with a single conditional update, so concurrent
    /// settles of sibling shares never overwrite each other.
    pub(super) async fn update_share(
        &self,
        db: &DatabaseTransaction,
        expense_id: Uuid,
        member_id: &str,
    ) -> ResultEngine<Settlement> {
        let expense_id = expense_id.to_string();
        let result = shares::Entity::update_many()
            .col_expr(shares::Column::Settled, Expr::value(true))
            .filter(shares::Column::ExpenseId.eq(expense_id.clone()))
            .filter(shares::Column::MemberId.eq(member_id.to_string()))
            .filter(shares::Column::Settled.eq(false))
            .exec(db)
            .await?;
        if result.rows_affected > 0 {
            return Ok(Settlement::Settled);
        }

        match shares::Entity::find_by_id((expense_id, member_id.to_string()))
            .one(db)
            .await?
        {
            Some(_) => Ok(Settlement::AlreadySettled),
            None => Err(EngineError::KeyNotFound("share not exists".to_string())),
        }
    }
}
