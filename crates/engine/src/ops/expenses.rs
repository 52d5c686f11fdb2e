use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    Currency, EngineError, Expense, ExpenseUpdate, LedgerEvent, NewExpense, ResultEngine,
    ValidationError, allocate, expenses, shares,
    util::normalize_text,
};

use super::{Engine, with_tx};

const DESCRIPTION_MAX_LEN: usize = 120;
const RECEIPT_URL_MAX_LEN: usize = 500;

impl Engine {
    /// Record an expense and its shares in one transaction.
    pub async fn create_expense(
        &self,
        room_id: &str,
        new_expense: NewExpense,
        user_id: &str,
    ) -> ResultEngine<Expense> {
        let description = normalize_text(
            &new_expense.description,
            "description",
            1,
            DESCRIPTION_MAX_LEN,
        )?;
        let shares = allocate(new_expense.amount, &new_expense.split)?;

        let (expense, message, summary) = with_tx!(self, |db_tx| {
            let membership = self.require_member(&db_tx, room_id, user_id).await?;
            let members = self.room_member_ids(&db_tx, room_id).await?;
            let is_member = |id: &str| members.iter().any(|m| m == id);

            if !is_member(&new_expense.paid_by) {
                return Err(ValidationError::field(
                    "paid_by",
                    format!("{} is not a room member", new_expense.paid_by),
                )
                .into());
            }
            if let Some(outsider) = shares.iter().find(|s| !is_member(&s.member_id)) {
                return Err(ValidationError::field(
                    "participants",
                    format!("{} is not a room member", outsider.member_id),
                )
                .into());
            }

            let now = Utc::now();
            let expense = Expense {
                id: Uuid::new_v4(),
                room_id: room_id.to_string(),
                description,
                category: new_expense.category.unwrap_or_default(),
                paid_by: new_expense.paid_by,
                amount: new_expense.amount,
                currency: Currency::parse(&membership.room.currency)?,
                shares,
                date: new_expense.date.unwrap_or(now),
                created_by: user_id.to_string(),
                receipt_url: None,
                deleted: false,
                created_at: now,
            };
            expenses::ActiveModel::from(&expense).insert(&db_tx).await?;
            let expense_id = expense.id.to_string();
            for (position, share) in expense.shares.iter().enumerate() {
                shares::ActiveModel::from_share(&expense_id, position, share)
                    .insert(&db_tx)
                    .await?;
            }

            let body = format!(
                "{user_id} added: {} ({} {})",
                expense.description, expense.amount, expense.currency
            );
            let message = self.insert_system_message(&db_tx, room_id, body).await?;
            let summary = self.summary_in(&db_tx, &membership.room).await?;
            Ok((expense, message, summary))
        })?;

        tracing::info!(
            room_id,
            expense_id = %expense.id,
            amount = expense.amount.cents(),
            shares = expense.shares.len(),
            "expense created"
        );
        self.publish_all(
            room_id,
            [
                LedgerEvent::ExpenseAdded(expense.clone()),
                LedgerEvent::NewMessage(message),
                LedgerEvent::SummaryUpdated(summary),
            ],
        );
        Ok(expense)
    }

    /// Non-deleted expenses of a room, newest first.
    pub async fn list_expenses(&self, room_id: &str, user_id: &str) -> ResultEngine<Vec<Expense>> {
        with_tx!(self, |db_tx| {
            self.require_member(&db_tx, room_id, user_id).await?;
            self.list_active_expenses(&db_tx, room_id).await
        })
    }

    pub async fn expense(&self, expense_id: Uuid, user_id: &str) -> ResultEngine<Expense> {
        with_tx!(self, |db_tx| {
            let model = self.require_expense(&db_tx, expense_id).await?;
            self.require_member(&db_tx, &model.room_id, user_id).await?;
            self.load_expense(&db_tx, model).await
        })
    }

    /// Edit description, category or date. Only the creator may edit.
    pub async fn update_expense(
        &self,
        expense_id: Uuid,
        update: ExpenseUpdate,
        user_id: &str,
    ) -> ResultEngine<Expense> {
        let description = update
            .description
            .as_deref()
            .map(|d| normalize_text(d, "description", 1, DESCRIPTION_MAX_LEN))
            .transpose()?;

        let expense = with_tx!(self, |db_tx| {
            let model = self.require_expense(&db_tx, expense_id).await?;
            self.require_member(&db_tx, &model.room_id, user_id).await?;
            ensure_creator(&model, user_id, "edit")?;

            let mut active: expenses::ActiveModel = model.into();
            if let Some(description) = description {
                active.description = ActiveValue::Set(description);
            }
            if let Some(category) = update.category {
                active.category = ActiveValue::Set(category.as_str().to_string());
            }
            if let Some(date) = update.date {
                active.date = ActiveValue::Set(date);
            }
            let model = active.update(&db_tx).await?;
            self.load_expense(&db_tx, model).await
        })?;

        tracing::info!(expense_id = %expense.id, "expense updated");
        self.notifier
            .publish(&expense.room_id, LedgerEvent::ExpenseUpdated(expense.clone()));
        Ok(expense)
    }

    /// Soft-delete an expense. Only the creator may delete.
    pub async fn delete_expense(&self, expense_id: Uuid, user_id: &str) -> ResultEngine<()> {
        let (room_id, summary) = with_tx!(self, |db_tx| {
            let model = self.require_expense(&db_tx, expense_id).await?;
            let membership = self.require_member(&db_tx, &model.room_id, user_id).await?;
            ensure_creator(&model, user_id, "delete")?;

            self.soft_delete_expense(&db_tx, expense_id).await?;
            let summary = self.summary_in(&db_tx, &membership.room).await?;
            Ok((model.room_id, summary))
        })?;

        tracing::info!(%expense_id, %room_id, "expense deleted");
        self.publish_all(
            &room_id,
            [
                LedgerEvent::ExpenseDeleted { expense_id },
                LedgerEvent::SummaryUpdated(summary),
            ],
        );
        Ok(())
    }

    /// Attach a receipt link to an expense. Any room member may do it.
    pub async fn set_receipt_url(
        &self,
        expense_id: Uuid,
        url: &str,
        user_id: &str,
    ) -> ResultEngine<Expense> {
        let url = normalize_text(url, "receipt url", 1, RECEIPT_URL_MAX_LEN)?;
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ValidationError::field("receipt url", "must be an http(s) URL").into());
        }

        let expense = with_tx!(self, |db_tx| {
            let model = self.require_expense(&db_tx, expense_id).await?;
            self.require_member(&db_tx, &model.room_id, user_id).await?;
            let mut active: expenses::ActiveModel = model.into();
            active.receipt_url = ActiveValue::Set(Some(url));
            let model = active.update(&db_tx).await?;
            self.load_expense(&db_tx, model).await
        })?;

        self.notifier
            .publish(&expense.room_id, LedgerEvent::ExpenseUpdated(expense.clone()));
        Ok(expense)
    }

    /// Flag an expense as deleted. A missing or already deleted expense is
    /// `KeyNotFound`.
    pub(super) async fn soft_delete_expense(
        &self,
        db: &DatabaseTransaction,
        expense_id: Uuid,
    ) -> ResultEngine<()> {
        let result = expenses::Entity::update_many()
            .col_expr(expenses::Column::Deleted, Expr::value(true))
            .filter(expenses::Column::Id.eq(expense_id.to_string()))
            .filter(expenses::Column::Deleted.eq(false))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::KeyNotFound("expense not exists".to_string()));
        }
        Ok(())
    }
}

fn ensure_creator(model: &expenses::Model, user_id: &str, action: &str) -> ResultEngine<()> {
    if model.created_by != user_id {
        tracing::warn!(expense_id = %model.id, user_id, action, "rejected non-creator");
        return Err(EngineError::Forbidden(format!(
            "only the creator can {action} this expense"
        )));
    }
    Ok(())
}
