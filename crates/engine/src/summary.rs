use serde::{Deserialize, Serialize};

use crate::{Balances, Currency, Expense, MoneyCents, Transfer, compute_balances, simplify};

/// What a room owes itself: total spent, net balances and the transfers
/// that would settle them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub room_id: String,
    pub currency: Currency,
    pub total_spent: MoneyCents,
    pub balances: Balances,
    pub transfers: Vec<Transfer>,
}

/// Builds the summary of a room from its expense history and roster.
///
/// `total_spent` adds up every non-deleted expense, settled or not.
pub fn summarize<I, M>(
    room_id: &str,
    currency: Currency,
    expenses: &[Expense],
    members: I,
) -> RoomSummary
where
    I: IntoIterator<Item = M>,
    M: AsRef<str>,
{
    let total_spent = expenses
        .iter()
        .filter(|e| !e.deleted)
        .map(|e| e.amount)
        .sum();
    let balances = compute_balances(expenses, members);
    let transfers = simplify(&balances);

    RoomSummary {
        room_id: room_id.to_string(),
        currency,
        total_spent,
        balances,
        transfers,
    }
}
