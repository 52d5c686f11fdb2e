//! Room API endpoints

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{Currency, NewRoom};

use crate::{
    ServerError,
    server::ServerState,
    types::{
        room::{RoomDetail, RoomJoin, RoomList, RoomNew, RoomView},
        summary::RoomSummary,
    },
    user, views,
};

/// Handle requests for creating a new room
pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<RoomNew>,
) -> Result<(StatusCode, Json<RoomView>), ServerError> {
    let currency = payload
        .currency
        .as_deref()
        .map(Currency::parse)
        .transpose()?;
    let room = state
        .engine
        .create_room(
            NewRoom {
                name: payload.name,
                description: payload.description,
                kind: payload.kind.map(views::room_kind_from_api),
                currency,
            },
            &user.username,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(views::room(room))))
}

/// Handle requests for joining a room through its invite code
pub async fn join(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<RoomJoin>,
) -> Result<Json<RoomView>, ServerError> {
    let room = state
        .engine
        .join_room(&payload.invite_code, &user.username)
        .await?;
    Ok(Json(views::room(room)))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<RoomList>, ServerError> {
    let rooms = state.engine.list_rooms(&user.username).await?;
    Ok(Json(RoomList {
        rooms: rooms.into_iter().map(views::room).collect(),
    }))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomDetail>, ServerError> {
    let detail = state.engine.room(&room_id, &user.username).await?;
    Ok(Json(views::room_detail(detail)))
}

/// Balances and suggested transfers, recomputed on each request
pub async fn summary(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomSummary>, ServerError> {
    let summary = state.engine.room_summary(&room_id, &user.username).await?;
    Ok(Json(views::summary(summary)))
}
