//! Game domain: everything the coordinating loop mutates, with no I/O.
//!
//! - [`Question`]: Host-authored prompt, immutable once created
//! - [`Player`]: Per-player record with its shared [`Purse`]
//! - [`Wager`]: One player's stake vector for one round
//! - [`Ledger`]: Wagers of the open round, closed atomically at the deadline
//! - [`Settlement`]: One-pass payout, elimination and jackpot accounting
//! - [`Game`]: The question → wager → settlement state machine
mod game;
mod ledger;
mod player;
mod question;
mod settlement;
mod wager;

pub use game::*;
pub use ledger::*;
pub use player::*;
pub use question::*;
pub use settlement::*;
pub use wager::*;
