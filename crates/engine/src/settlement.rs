//! Settlement tracker.
//!
//! Each [`Share`] is a two-state machine: `Unsettled -> Settled`. Settling is
//! idempotent and there is no way back; once a share is settled it stops
//! contributing to balances on the next recomputation.

use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine, Share};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareState {
    Unsettled,
    Settled,
}

/// Outcome of a settle request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Settlement {
    /// The share moved from unsettled to settled.
    Settled,
    /// The share was already settled; nothing changed.
    AlreadySettled,
}

impl Settlement {
    pub fn changed(self) -> bool {
        matches!(self, Self::Settled)
    }
}

impl Share {
    pub fn state(&self) -> ShareState {
        if self.settled {
            ShareState::Settled
        } else {
            ShareState::Unsettled
        }
    }

    /// Marks the share as settled.
    pub fn mark_settled(&mut self) -> Settlement {
        match self.state() {
            ShareState::Unsettled => {
                self.settled = true;
                Settlement::Settled
            }
            ShareState::Settled => Settlement::AlreadySettled,
        }
    }
}

/// Who is asking to settle a share, as seen from the room.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SettleActor<'a> {
    pub user_id: &'a str,
    pub is_admin: bool,
}

/// A member may settle their own share. The room admin and the expense payer
/// (who receives the money) may settle it on the member's behalf.
pub(crate) fn ensure_can_settle(
    actor: SettleActor<'_>,
    member_id: &str,
    paid_by: &str,
) -> ResultEngine<()> {
    if actor.user_id == member_id || actor.user_id == paid_by || actor.is_admin {
        return Ok(());
    }
    Err(EngineError::Forbidden(
        "only the member, the payer or a room admin can settle this share".to_string(),
    ))
}
