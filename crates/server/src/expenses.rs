//! Expense API endpoints

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{MoneyCents, NewExpense, Split};
use uuid::Uuid;

use crate::{
    ServerError,
    server::ServerState,
    types::expense::{
        ExpenseList, ExpenseNew, ExpenseUpdate, ExpenseView, ReceiptSet, SettleResponse,
        SettleShare, SplitNew,
    },
    user, views,
};

fn split_from_api(split: SplitNew) -> Split {
    match split {
        SplitNew::Equal { participants } => Split::equal(participants),
        SplitNew::Unequal { shares } => Split::unequal(
            shares
                .into_iter()
                .map(|s| (s.member, MoneyCents::new(s.amount_minor))),
        ),
    }
}

/// Handle requests for recording a new expense
pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(room_id): Path<String>,
    Json(payload): Json<ExpenseNew>,
) -> Result<(StatusCode, Json<ExpenseView>), ServerError> {
    let new_expense = NewExpense {
        description: payload.description,
        amount: MoneyCents::new(payload.amount_minor),
        category: payload.category.map(views::category_from_api),
        paid_by: payload.paid_by.unwrap_or_else(|| user.username.clone()),
        date: payload.date.map(|d| d.with_timezone(&Utc)),
        split: split_from_api(payload.split),
    };
    let expense = state
        .engine
        .create_expense(&room_id, new_expense, &user.username)
        .await?;

    Ok((StatusCode::CREATED, Json(views::expense(expense))))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(room_id): Path<String>,
) -> Result<Json<ExpenseList>, ServerError> {
    let expenses = state.engine.list_expenses(&room_id, &user.username).await?;
    Ok(Json(ExpenseList {
        expenses: expenses.into_iter().map(views::expense).collect(),
    }))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(expense_id): Path<Uuid>,
) -> Result<Json<ExpenseView>, ServerError> {
    let expense = state.engine.expense(expense_id, &user.username).await?;
    Ok(Json(views::expense(expense)))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(expense_id): Path<Uuid>,
    Json(payload): Json<ExpenseUpdate>,
) -> Result<Json<ExpenseView>, ServerError> {
    let update = engine::ExpenseUpdate {
        description: payload.description,
        category: payload.category.map(views::category_from_api),
        date: payload.date.map(|d| d.with_timezone(&Utc)),
    };
    let expense = state
        .engine
        .update_expense(expense_id, update, &user.username)
        .await?;
    Ok(Json(views::expense(expense)))
}

pub async fn delete(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(expense_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_expense(expense_id, &user.username)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Mark a share as settled. An empty body settles the caller's own share.
pub async fn settle(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(expense_id): Path<Uuid>,
    payload: Option<Json<SettleShare>>,
) -> Result<Json<SettleResponse>, ServerError> {
    let Json(payload) = payload.unwrap_or_default();
    let (settlement, expense) = state
        .engine
        .settle_share(expense_id, payload.member.as_deref(), &user.username)
        .await?;
    Ok(Json(SettleResponse {
        status: views::settle_status(settlement),
        expense: views::expense(expense),
    }))
}

pub async fn set_receipt(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(expense_id): Path<Uuid>,
    Json(payload): Json<ReceiptSet>,
) -> Result<Json<ExpenseView>, ServerError> {
    let expense = state
        .engine
        .set_receipt_url(expense_id, &payload.url, &user.username)
        .await?;
    Ok(Json(views::expense(expense)))
}
