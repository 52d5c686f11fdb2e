//! Server-Sent Events feed of a room's ledger changes.

use std::{convert::Infallible, time::Duration};

use axum::{
    Extension,
    extract::{Path, State},
    response::sse::{Event as SseEvent, KeepAlive, Sse},
};
use futures_core::stream::Stream;
use tokio_stream::wrappers::{BroadcastStream, errors::BroadcastStreamRecvError};

use crate::{ServerError, server::ServerState, user, views};

/// Stream `expense_added`, `expense_updated`, `expense_deleted`,
/// `new_message` and `summary_updated` events of one room.
pub async fn stream(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(room_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>, ServerError> {
    // Membership gate: non-members never subscribe.
    state.engine.room(&room_id, &user.username).await?;
    tracing::debug!(%room_id, username = %user.username, "event stream opened");

    let receiver = BroadcastStream::new(state.events.subscribe());
    let stream = tokio_stream::StreamExt::filter_map(receiver, move |event| match event {
        Ok(evt) if evt.room_id == room_id => {
            let name = evt.event.kind();
            match views::event_payload(evt.event) {
                Ok(payload) => match SseEvent::default().event(name).json_data(payload) {
                    Ok(sse_event) => Some(Ok(sse_event)),
                    Err(err) => {
                        tracing::error!("Failed to encode SSE event {name}: {err}");
                        None
                    }
                },
                Err(err) => {
                    tracing::error!("Failed to serialize SSE payload for {name}: {err}");
                    None
                }
            }
        }
        Ok(_) => None,
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "event stream lagged");
            None
        }
    });

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    ))
}
