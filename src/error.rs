use crate::Tokens;
use crate::UserId;

/// Failures converting or combining token amounts.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TokensError {
    #[error("amount is not a finite number")]
    NotFinite,
    #[error("amount {0} is negative")]
    Negative(f64),
    #[error("amount {0} is too large")]
    TooLarge(f64),
    #[error("amount {0:?} is not a number")]
    Unparsable(String),
    #[error("{lhs} - {rhs} would be negative")]
    Underflow { lhs: Tokens, rhs: Tokens },
    #[error("{lhs} + {rhs} overflows")]
    Overflow { lhs: Tokens, rhs: Tokens },
}

/// Reasons a wager submission is turned away.
/// None of these are fatal; the player just gets a `bet_rejected` notice.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Rejection {
    #[error("no question is open for bets")]
    NoActiveRound,
    #[error("bet is for question {got}, but the open question is {open}")]
    WrongQuestion { got: String, open: String },
    #[error("player {0} is not in the game")]
    UnknownPlayer(UserId),
    #[error("player {0} has been eliminated")]
    Eliminated(UserId),
    #[error("expected {expected} stakes, got {got}")]
    StakeCount { expected: usize, got: usize },
    #[error("invalid stake: {0}")]
    InvalidStake(#[from] TokensError),
    #[error("total stake {total} exceeds available balance {available}")]
    InsufficientBalance { total: Tokens, available: Tokens },
}

/// Reasons a host's question is refused.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QuestionError {
    #[error("question text is empty")]
    EmptyPrompt,
    #[error("question needs {min}-{max} non-empty options, got {got}")]
    OptionCount { min: usize, max: usize, got: usize },
    #[error("correct index {index} is out of range for {options} options")]
    CorrectIndex { index: usize, options: usize },
    #[error("time limit {secs}s is outside {min}s..={max}s")]
    TimeLimit { secs: u64, min: u64, max: u64 },
    #[error("the game has ended")]
    GameEnded,
}

/// Malformed frames from a peer. Logged and ignored by the connection loop.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("binary frames are not supported")]
    Binary,
}

/// Invariant violations inside the coordinating loop.
/// These mean the loop's own bookkeeping is wrong, never that a peer misbehaved.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HubError {
    #[error("token arithmetic failed during settlement: {0}")]
    Arithmetic(#[from] TokensError),
    #[error("settlement attempted with no round in progress")]
    NothingToSettle,
}

/// Failures reported by the persistent-balance collaborator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AccountsError {
    #[error("{user} holds {balance}, cannot debit {requested}")]
    Insufficient {
        user: UserId,
        balance: Tokens,
        requested: Tokens,
    },
    #[error("balance arithmetic failed: {0}")]
    Arithmetic(#[from] TokensError),
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn rejection_messages() {
        let err = Rejection::InsufficientBalance {
            total: Tokens::whole(60),
            available: Tokens::whole(50),
        };
        assert_eq!(
            err.to_string(),
            "total stake 60 exceeds available balance 50"
        );
        let err = Rejection::StakeCount {
            expected: 2,
            got: 3,
        };
        assert_eq!(err.to_string(), "expected 2 stakes, got 3");
    }
    #[test]
    fn errors_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Rejection>();
        assert_send_sync::<QuestionError>();
        assert_send_sync::<ProtocolError>();
        assert_send_sync::<HubError>();
        assert_send_sync::<AccountsError>();
    }
}
