//! Persistent off-chain balances, reached only at session boundaries.
//!
//! The hub keeps its own in-memory game balance per player. This seam
//! reconciles it with the persistent balance: an entry fee may be debited
//! when a session starts, and a winner's final balance is credited back
//! when a game ends. The coordinating loop never awaits it.
mod memory;

pub use memory::*;

use crate::*;

/// Direction and size of a balance change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    Credit(Tokens),
    Debit(Tokens),
}

impl std::fmt::Display for Adjustment {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Adjustment::Credit(t) => write!(f, "+{}", t),
            Adjustment::Debit(t) => write!(f, "-{}", t),
        }
    }
}

#[async_trait::async_trait]
pub trait Accounts: Send + Sync {
    /// Current persistent balance. Unknown users hold nothing.
    async fn balance(&self, user: &UserId) -> Result<Tokens, AccountsError>;
    /// Applies `delta`, returning the new balance. A debit never overdraws.
    async fn adjust(&self, user: &UserId, delta: Adjustment) -> Result<Tokens, AccountsError>;
}
