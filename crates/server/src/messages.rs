//! Room chat endpoints

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    ServerError,
    server::ServerState,
    types::message::{MessageList, MessageNew, MessageView},
    user, views,
};

pub async fn post(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(room_id): Path<String>,
    Json(payload): Json<MessageNew>,
) -> Result<(StatusCode, Json<MessageView>), ServerError> {
    let message = state
        .engine
        .post_message(&room_id, &payload.body, &user.username)
        .await?;
    Ok((StatusCode::CREATED, Json(views::message(message))))
}

/// Latest messages, oldest first
pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(room_id): Path<String>,
) -> Result<Json<MessageList>, ServerError> {
    let messages = state.engine.list_messages(&room_id, &user.username).await?;
    Ok(Json(MessageList {
        messages: messages.into_iter().map(views::message).collect(),
    }))
}
