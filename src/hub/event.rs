use super::*;
use crate::quiz::*;
use crate::*;

/// Everything the coordinating loop reacts to, in arrival order.
/// Connection handles produce the peer events; the loop's own timers
/// produce `Deadline` and `Cooldown`.
#[derive(Debug)]
pub enum Event {
    /// A player connected (or reconnected) with a fresh outbound queue.
    Join {
        user: UserId,
        name: String,
        outbox: Outbox,
        purse: Purse,
    },
    /// A player connection ended. Ignored if `conn` is no longer current.
    Leave { user: UserId, conn: ID<Outbox> },
    HostJoin { outbox: Outbox },
    HostLeave { conn: ID<Outbox> },
    SubmitQuestion(QuestionDraft),
    SubmitWager {
        user: UserId,
        question: String,
        bets: Vec<f64>,
    },
    NewGame,
    /// Round `round` ran out of time.
    Deadline { round: u64 },
    /// The pause after round `round` is over.
    Cooldown { round: u64 },
    /// Elimination grace for `user` on connection `conn` has run out.
    Evict { user: UserId, conn: ID<Outbox> },
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Event::Join { user, name, .. } => write!(f, "join {} ({})", user, name),
            Event::Leave { user, .. } => write!(f, "leave {}", user),
            Event::HostJoin { .. } => write!(f, "host join"),
            Event::HostLeave { .. } => write!(f, "host leave"),
            Event::SubmitQuestion(draft) => write!(f, "question {:?}", draft.question),
            Event::SubmitWager { user, bets, .. } => write!(f, "wager {} {:?}", user, bets),
            Event::NewGame => write!(f, "new game"),
            Event::Deadline { round } => write!(f, "deadline #{}", round),
            Event::Cooldown { round } => write!(f, "cooldown #{}", round),
            Event::Evict { user, .. } => write!(f, "evict {}", user),
        }
    }
}
