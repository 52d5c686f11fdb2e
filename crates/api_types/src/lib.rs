//! Request and response bodies of the Roomledger HTTP API.
//!
//! Amounts always travel as integer minor units (`*_minor`, cents).

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod user {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserNew {
        pub username: String,
        pub password: String,
    }
}

pub mod room {
    use super::*;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum RoomKind {
        Trip,
        Roommates,
        #[default]
        General,
    }

    /// Role of a user in a room.
    ///
    /// - `admin`: created the room; can settle shares for other members.
    /// - `member`: joined with the invite code.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum MemberRole {
        Admin,
        Member,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RoomNew {
        pub name: String,
        pub description: Option<String>,
        pub kind: Option<RoomKind>,
        /// ISO-like currency code, e.g. `MAD`. Defaults to `MAD`.
        pub currency: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RoomJoin {
        pub invite_code: String,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct RoomView {
        pub id: String,
        pub name: String,
        pub description: String,
        pub kind: RoomKind,
        pub currency: String,
        pub invite_code: String,
        pub created_by: String,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RoomList {
        pub rooms: Vec<RoomView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberView {
        pub username: String,
        pub role: MemberRole,
        pub joined_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RoomDetail {
        pub room: RoomView,
        pub members: Vec<MemberView>,
    }
}

pub mod expense {
    use super::*;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Category {
        Food,
        Transport,
        Accommodation,
        Entertainment,
        Utilities,
        Groceries,
        #[default]
        Other,
    }

    impl Category {
        /// Returns the canonical category string used by the engine/database.
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Food => "food",
                Self::Transport => "transport",
                Self::Accommodation => "accommodation",
                Self::Entertainment => "entertainment",
                Self::Utilities => "utilities",
                Self::Groceries => "groceries",
                Self::Other => "other",
            }
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ShareAmount {
        pub member: String,
        pub amount_minor: i64,
    }

    /// How an expense is divided.
    ///
    /// ```json
    /// { "mode": "equal", "participants": ["alice", "bob"] }
    /// { "mode": "unequal", "shares": [{ "member": "alice", "amount_minor": 4000 }] }
    /// ```
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(tag = "mode", rename_all = "snake_case")]
    pub enum SplitNew {
        Equal { participants: Vec<String> },
        Unequal { shares: Vec<ShareAmount> },
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub description: String,
        pub amount_minor: i64,
        pub category: Option<Category>,
        /// Defaults to the authenticated user.
        pub paid_by: Option<String>,
        /// RFC3339 timestamp. Defaults to now.
        pub date: Option<DateTime<FixedOffset>>,
        pub split: SplitNew,
    }

    /// Edit of the non-financial fields; absent fields are left untouched.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ExpenseUpdate {
        pub description: Option<String>,
        pub category: Option<Category>,
        pub date: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ShareView {
        pub member: String,
        pub owed_minor: i64,
        pub settled: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseView {
        pub id: Uuid,
        pub room_id: String,
        pub description: String,
        pub category: Category,
        pub paid_by: String,
        pub amount_minor: i64,
        pub currency: String,
        pub shares: Vec<ShareView>,
        pub date: DateTime<Utc>,
        pub created_by: String,
        pub receipt_url: Option<String>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseList {
        pub expenses: Vec<ExpenseView>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct SettleShare {
        /// Whose share to settle. Defaults to the authenticated user.
        pub member: Option<String>,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum SettleStatus {
        Settled,
        AlreadySettled,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettleResponse {
        pub status: SettleStatus,
        pub expense: ExpenseView,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReceiptSet {
        pub url: String,
    }
}

pub mod summary {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceView {
        pub member: String,
        /// Positive: the room owes this member. Negative: the member owes.
        pub balance_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferView {
        pub from: String,
        pub to: String,
        pub amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RoomSummary {
        pub room_id: String,
        pub currency: String,
        pub total_spent_minor: i64,
        pub balances: Vec<BalanceView>,
        pub transfers: Vec<TransferView>,
    }
}

pub mod message {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum MessageKind {
        Text,
        System,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MessageNew {
        pub body: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MessageView {
        pub id: Uuid,
        /// `None` for system messages.
        pub sender: Option<String>,
        pub body: String,
        pub kind: MessageKind,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MessageList {
        pub messages: Vec<MessageView>,
    }
}
