//! Shared-ledger engine for rooms of people splitting expenses.
//!
//! The pure core lives in four modules, each usable without a database:
//!
//! - [`split`]: turns a total and a split rule into validated [`Share`]s.
//! - [`balances`]: folds an expense history into per-member [`Balances`].
//! - [`simplify`]: reduces balances to a short list of [`Transfer`]s.
//! - [`settlement`]: the per-share settled/unsettled state machine.
//!
//! [`Engine`] wraps them with sea-orm persistence, room membership checks and
//! a [`LedgerNotifier`] that is told every time a room's ledger changes.

pub use balances::{Balances, compute_balances};
pub use currency::Currency;
pub use error::{EngineError, ValidationError};
pub use expenses::{Category, Expense, ExpenseUpdate, NewExpense};
pub use messages::{Message, MessageKind};
pub use money::MoneyCents;
pub use notifier::{BroadcastNotifier, LedgerEvent, LedgerNotifier, NoopNotifier, RoomEvent};
pub use ops::{Engine, EngineBuilder};
pub use rooms::{MemberRole, NewRoom, Room, RoomDetail, RoomKind, RoomMember};
pub use settlement::{Settlement, ShareState};
pub use shares::Share;
pub use simplify::{Transfer, simplify};
pub use split::{Split, SplitMode, allocate};
pub use summary::{RoomSummary, summarize};

pub mod balances;
mod currency;
mod error;
mod expenses;
mod messages;
mod money;
mod notifier;
mod ops;
mod room_members;
mod rooms;
pub mod settlement;
mod shares;
pub mod simplify;
pub mod split;
mod summary;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
