//! Engine model -> API view conversions.

use engine::{
    Category, Expense, LedgerEvent, MemberRole, Message, MessageKind, Room, RoomDetail, RoomKind,
    RoomMember, RoomSummary, Settlement,
};

use crate::types::{
    expense::{self as api_expense, ExpenseView, SettleStatus, ShareView},
    message::{self as api_message, MessageView},
    room::{self as api_room, MemberView, RoomView},
    summary::{self as api_summary, BalanceView, TransferView},
};

pub(crate) fn room_kind_from_api(kind: api_room::RoomKind) -> RoomKind {
    match kind {
        api_room::RoomKind::Trip => RoomKind::Trip,
        api_room::RoomKind::Roommates => RoomKind::Roommates,
        api_room::RoomKind::General => RoomKind::General,
    }
}

fn room_kind_to_api(kind: RoomKind) -> api_room::RoomKind {
    match kind {
        RoomKind::Trip => api_room::RoomKind::Trip,
        RoomKind::Roommates => api_room::RoomKind::Roommates,
        RoomKind::General => api_room::RoomKind::General,
    }
}

pub(crate) fn category_from_api(category: api_expense::Category) -> Category {
    match category {
        api_expense::Category::Food => Category::Food,
        api_expense::Category::Transport => Category::Transport,
        api_expense::Category::Accommodation => Category::Accommodation,
        api_expense::Category::Entertainment => Category::Entertainment,
        api_expense::Category::Utilities => Category::Utilities,
        api_expense::Category::Groceries => Category::Groceries,
        api_expense::Category::Other => Category::Other,
    }
}

fn category_to_api(category: Category) -> api_expense::Category {
    match category {
        Category::Food => api_expense::Category::Food,
        Category::Transport => api_expense::Category::Transport,
        Category::Accommodation => api_expense::Category::Accommodation,
        Category::Entertainment => api_expense::Category::Entertainment,
        Category::Utilities => api_expense::Category::Utilities,
        Category::Groceries => api_expense::Category::Groceries,
        Category::Other => api_expense::Category::Other,
    }
}

pub(crate) fn room(room: Room) -> RoomView {
    RoomView {
        id: room.id,
        name: room.name,
        description: room.description,
        kind: room_kind_to_api(room.kind),
        currency: room.currency.code().to_string(),
        invite_code: room.invite_code,
        created_by: room.created_by,
        created_at: room.created_at,
    }
}

fn member(member: RoomMember) -> MemberView {
    MemberView {
        username: member.user_id,
        role: match member.role {
            MemberRole::Admin => api_room::MemberRole::Admin,
            MemberRole::Member => api_room::MemberRole::Member,
        },
        joined_at: member.joined_at,
    }
}

pub(crate) fn room_detail(detail: RoomDetail) -> api_room::RoomDetail {
    api_room::RoomDetail {
        room: room(detail.room),
        members: detail.members.into_iter().map(member).collect(),
    }
}

pub(crate) fn expense(expense: Expense) -> ExpenseView {
    ExpenseView {
        id: expense.id,
        room_id: expense.room_id,
        description: expense.description,
        category: category_to_api(expense.category),
        paid_by: expense.paid_by,
        amount_minor: expense.amount.cents(),
        currency: expense.currency.code().to_string(),
        shares: expense
            .shares
            .into_iter()
            .map(|share| ShareView {
                member: share.member_id,
                owed_minor: share.owed.cents(),
                settled: share.settled,
            })
            .collect(),
        date: expense.date,
        created_by: expense.created_by,
        receipt_url: expense.receipt_url,
        created_at: expense.created_at,
    }
}

pub(crate) fn settle_status(settlement: Settlement) -> SettleStatus {
    match settlement {
        Settlement::Settled => SettleStatus::Settled,
        Settlement::AlreadySettled => SettleStatus::AlreadySettled,
    }
}

pub(crate) fn summary(summary: RoomSummary) -> api_summary::RoomSummary {
    api_summary::RoomSummary {
        room_id: summary.room_id,
        currency: summary.currency.code().to_string(),
        total_spent_minor: summary.total_spent.cents(),
        balances: summary
            .balances
            .into_iter()
            .map(|(member, balance)| BalanceView {
                member,
                balance_minor: balance.cents(),
            })
            .collect(),
        transfers: summary
            .transfers
            .into_iter()
            .map(|t| TransferView {
                from: t.from,
                to: t.to,
                amount_minor: t.amount.cents(),
            })
            .collect(),
    }
}

pub(crate) fn message(message: Message) -> MessageView {
    MessageView {
        id: message.id,
        sender: message.sender_id,
        body: message.body,
        kind: match message.kind {
            MessageKind::Text => api_message::MessageKind::Text,
            MessageKind::System => api_message::MessageKind::System,
        },
        created_at: message.created_at,
    }
}

/// JSON body of a ledger event as sent to SSE clients.
pub(crate) fn event_payload(event: LedgerEvent) -> serde_json::Result<serde_json::Value> {
    match event {
        LedgerEvent::ExpenseAdded(e) | LedgerEvent::ExpenseUpdated(e) => {
            serde_json::to_value(expense(e))
        }
        LedgerEvent::ExpenseDeleted { expense_id } => {
            Ok(serde_json::json!({ "expense_id": expense_id }))
        }
        LedgerEvent::NewMessage(m) => serde_json::to_value(message(m)),
        LedgerEvent::SummaryUpdated(s) => serde_json::to_value(summary(s)),
    }
}
