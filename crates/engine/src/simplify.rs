//! Debt simplifier.
//!
//! Turns net [`Balances`] into a list of suggested payments using a greedy
//! two-cursor match between the largest debtor and the largest creditor.
//! The result needs at most `creditors + debtors - 1` transfers; it is not
//! guaranteed to be the minimum number of transfers (exact minimization is
//! NP-hard).

use serde::{Deserialize, Serialize};

use crate::{Balances, MoneyCents};

/// Balances whose magnitude does not exceed this are already settled.
///
/// Amounts are whole cents, so any non-zero balance is a real debt.
pub const DUST: MoneyCents = MoneyCents::ZERO;

/// A suggested payment from `from` to `to`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: String,
    pub to: String,
    pub amount: MoneyCents,
}

struct Position<'a> {
    member_id: &'a str,
    remaining: MoneyCents,
}

/// Computes transfers that bring every balance back to zero.
///
/// Creditors and debtors are each sorted by amount, largest first. The sort
/// is stable and balances iterate in member-id order, so equal amounts are
/// matched in member-id order and the output is deterministic.
pub fn simplify(balances: &Balances) -> Vec<Transfer> {
    let mut creditors: Vec<Position<'_>> = Vec::new();
    let mut debtors: Vec<Position<'_>> = Vec::new();

    for (member_id, balance) in balances.iter() {
        if balance > DUST {
            creditors.push(Position {
                member_id,
                remaining: balance,
            });
        } else if balance < -DUST {
            debtors.push(Position {
                member_id,
                remaining: balance.abs(),
            });
        }
    }

    creditors.sort_by(|a, b| b.remaining.cmp(&a.remaining));
    debtors.sort_by(|a, b| b.remaining.cmp(&a.remaining));

    let mut transfers = Vec::with_capacity((creditors.len() + debtors.len()).saturating_sub(1));
    let (mut i, mut j) = (0, 0);

    while i < debtors.len() && j < creditors.len() {
        let debtor = &mut debtors[i];
        let creditor = &mut creditors[j];

        let pay = debtor.remaining.min(creditor.remaining);
        transfers.push(Transfer {
            from: debtor.member_id.to_string(),
            to: creditor.member_id.to_string(),
            amount: pay,
        });

        debtor.remaining -= pay;
        creditor.remaining -= pay;

        if debtor.remaining <= DUST {
            i += 1;
        }
        if creditor.remaining <= DUST {
            j += 1;
        }
    }

    tracing::trace!(transfers = transfers.len(), "simplified balances");
    transfers
}
