//! Balance calculator.
//!
//! Folds a room's expense history into a signed net position per member:
//! positive means the member is owed money, negative means they owe money.
//! Every debit is paired with an equal credit, so a room's balances always
//! sum to zero.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Expense, MoneyCents};

/// Net balance per member, iterated in member-id order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Balances(BTreeMap<String, MoneyCents>);

impl Balances {
    /// Balance of `member_id`, `None` if the member is unknown.
    pub fn get(&self, member_id: &str) -> Option<MoneyCents> {
        self.0.get(member_id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, MoneyCents)> {
        self.0.iter().map(|(id, amount)| (id.as_str(), *amount))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of every balance. Zero for any balances built by
    /// [`compute_balances`].
    pub fn total(&self) -> MoneyCents {
        self.0.values().sum()
    }

    /// Returns `true` when nobody owes anything.
    pub fn is_settled(&self) -> bool {
        self.0.values().all(|amount| amount.is_zero())
    }

    fn credit(&mut self, member_id: &str, amount: MoneyCents) {
        *self.0.entry(member_id.to_string()).or_default() += amount;
    }

    fn debit(&mut self, member_id: &str, amount: MoneyCents) {
        *self.0.entry(member_id.to_string()).or_default() -= amount;
    }
}

impl<S: Into<String>> FromIterator<(S, MoneyCents)> for Balances {
    fn from_iter<T: IntoIterator<Item = (S, MoneyCents)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(id, amount)| (id.into(), amount)).collect())
    }
}

impl IntoIterator for Balances {
    type Item = (String, MoneyCents);
    type IntoIter = std::collections::btree_map::IntoIter<String, MoneyCents>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Computes the net balance of every member from the expense history.
///
/// - Every member of `members` appears in the result, even with no expense.
/// - Deleted expenses and settled shares contribute nothing.
/// - A payer's own share of their expense is skipped.
/// - A share owed by someone missing from `members` (e.g. a member who left
///   the room) still shows up, so the result keeps summing to zero.
///
/// Amounts are integer cents, so no rounding happens here.
pub fn compute_balances<I, M>(expenses: &[Expense], members: I) -> Balances
where
    I: IntoIterator<Item = M>,
    M: AsRef<str>,
{
    let mut balances: Balances = members
        .into_iter()
        .map(|m| (m.as_ref().to_string(), MoneyCents::ZERO))
        .collect();

    for expense in expenses.iter().filter(|e| !e.deleted) {
        for share in &expense.shares {
            if share.settled || share.member_id == expense.paid_by {
                continue;
            }
            balances.debit(&share.member_id, share.owed);
            balances.credit(&expense.paid_by, share.owed);
        }
    }

    balances
}
