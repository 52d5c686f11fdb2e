use std::collections::HashMap;

use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, Expense, MemberRole, ResultEngine, expenses, room_members, rooms, shares, users,
};

use super::Engine;

/// A caller's confirmed membership in a room.
pub(super) struct Membership {
    pub room: rooms::Model,
    pub role: MemberRole,
}

impl Engine {
    pub(super) async fn require_room(
        &self,
        db: &DatabaseTransaction,
        room_id: &str,
    ) -> ResultEngine<rooms::Model> {
        rooms::Entity::find_by_id(room_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("room not exists".to_string()))
    }

    pub(super) async fn member_role(
        &self,
        db: &DatabaseTransaction,
        room_id: &str,
        user_id: &str,
    ) -> ResultEngine<Option<MemberRole>> {
        let row = room_members::Entity::find_by_id((room_id.to_string(), user_id.to_string()))
            .one(db)
            .await?;
        row.as_ref()
            .map(|m| MemberRole::try_from(m.role.as_str()))
            .transpose()
    }

    /// Unknown room is `KeyNotFound`; known room but not a member is
    /// `Forbidden`.
    pub(super) async fn require_member(
        &self,
        db: &DatabaseTransaction,
        room_id: &str,
        user_id: &str,
    ) -> ResultEngine<Membership> {
        let room = self.require_room(db, room_id).await?;
        let Some(role) = self.member_role(db, room_id, user_id).await? else {
            tracing::warn!(room_id, user_id, "rejected non-member");
            return Err(EngineError::Forbidden(
                "not a member of this room".to_string(),
            ));
        };
        Ok(Membership { room, role })
    }

    /// Current roster of a room, in join order.
    pub(super) async fn room_member_ids(
        &self,
        db: &DatabaseTransaction,
        room_id: &str,
    ) -> ResultEngine<Vec<String>> {
        let rows = room_members::Entity::find()
            .filter(room_members::Column::RoomId.eq(room_id.to_string()))
            .order_by_asc(room_members::Column::JoinedAt)
            .order_by_asc(room_members::Column::UserId)
            .all(db)
            .await?;
        Ok(rows.into_iter().map(|m| m.user_id).collect())
    }

    pub(super) async fn require_user_exists(
        &self,
        db: &DatabaseTransaction,
        username: &str,
    ) -> ResultEngine<()> {
        let exists = users::Entity::find_by_id(username.to_string())
            .one(db)
            .await?
            .is_some();
        if !exists {
            return Err(EngineError::KeyNotFound("user not exists".to_string()));
        }
        Ok(())
    }

    /// A non-deleted expense row. Deleted expenses are reported as missing.
    pub(super) async fn require_expense(
        &self,
        db: &DatabaseTransaction,
        expense_id: Uuid,
    ) -> ResultEngine<expenses::Model> {
        expenses::Entity::find_by_id(expense_id.to_string())
            .filter(expenses::Column::Deleted.eq(false))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("expense not exists".to_string()))
    }

    /// Attach shares to an expense row.
    pub(super) async fn load_expense(
        &self,
        db: &DatabaseTransaction,
        model: expenses::Model,
    ) -> ResultEngine<Expense> {
        let share_models = shares::Entity::find()
            .filter(shares::Column::ExpenseId.eq(model.id.clone()))
            .all(db)
            .await?;
        Expense::try_from((model, share_models))
    }

    /// Every non-deleted expense of a room with its shares, newest first.
    pub(super) async fn list_active_expenses(
        &self,
        db: &DatabaseTransaction,
        room_id: &str,
    ) -> ResultEngine<Vec<Expense>> {
        let models = expenses::Entity::find()
            .filter(expenses::Column::RoomId.eq(room_id.to_string()))
            .filter(expenses::Column::Deleted.eq(false))
            .order_by_desc(expenses::Column::Date)
            .order_by_desc(expenses::Column::CreatedAt)
            .all(db)
            .await?;
        if models.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = models.iter().map(|m| m.id.clone()).collect();
        let mut by_expense: HashMap<String, Vec<shares::Model>> = HashMap::new();
        for share in shares::Entity::find()
            .filter(shares::Column::ExpenseId.is_in(ids))
            .all(db)
            .await?
        {
            by_expense
                .entry(share.expense_id.clone())
                .or_default()
                .push(share);
        }

        models
            .into_iter()
            .map(|model| {
                let shares = by_expense.remove(&model.id).unwrap_or_default();
                Expense::try_from((model, shares))
            })
            .collect()
    }
}
