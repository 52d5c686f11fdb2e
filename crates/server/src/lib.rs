use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::{EngineError, ValidationError};

use serde::Serialize;
pub use server::{ServerState, app_router, run, run_with_listener};

mod events;
mod expenses;
mod messages;
mod rooms;
mod server;
mod user;
mod views;

pub mod types {
    pub mod room {
        pub use api_types::room::{
            MemberRole, MemberView, RoomDetail, RoomJoin, RoomKind, RoomList, RoomNew, RoomView,
        };
    }

    pub mod expense {
        pub use api_types::expense::{
            Category, ExpenseList, ExpenseNew, ExpenseUpdate, ExpenseView, ReceiptSet,
            SettleResponse, SettleShare, SettleStatus, ShareAmount, ShareView, SplitNew,
        };
    }

    pub mod summary {
        pub use api_types::summary::{BalanceView, RoomSummary, TransferView};
    }

    pub mod message {
        pub use api_types::message::{MessageKind, MessageList, MessageNew, MessageView};
    }

    pub mod user {
        pub use api_types::user::UserNew;
    }
}

/// Engine failure rendered as a JSON `{"error": ...}` body.
pub struct ServerError(EngineError);

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) => StatusCode::CONFLICT,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::Validation(_) | EngineError::InvalidAmount(_) | EngineError::InvalidId(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let status = status_for_engine_error(&self.0);
        let error = message_for_engine_error(self.0);

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self(value)
    }
}

impl From<ValidationError> for ServerError {
    fn from(value: ValidationError) -> Self {
        Self(value.into())
    }
}
