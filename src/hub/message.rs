use crate::quiz::*;
use crate::*;
use serde::Deserialize;
use serde::Serialize;

/// Messages sent from the hub to players and the host.
/// Host-only variants are never broadcast to players.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Snapshot sent on join, reconnect and new game.
    GameState {
        game_active: bool,
        jackpot: Tokens,
        tokens: Tokens,
        is_active: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        current_question: Option<QuestionView>,
        /// Milliseconds left on the open question, by the hub's clock.
        #[serde(skip_serializing_if = "Option::is_none")]
        remaining_ms: Option<u64>,
    },
    NewQuestion { question: QuestionView },
    BetConfirmed {
        question_id: String,
        bets: Vec<Tokens>,
        new_balance: Tokens,
    },
    BetRejected { reason: String },
    /// Answer to a UI balance ping.
    Balance { tokens: Tokens },
    Results(Results),
    /// Terminal notice; the transport closes shortly after.
    Eliminated { message: String },
    GameEnded {
        outcome: Outcome,
        #[serde(skip_serializing_if = "Option::is_none")]
        results: Option<Results>,
    },
    QuestionQueued {
        question_id: ID<Question>,
        queue_position: usize,
    },
    QuestionLive { question_id: ID<Question> },
    QuestionRejected { reason: String },
    ReadyForQuestion { remaining_players: usize },
    /// Snapshot sent to a host on connect and after a new game.
    HostState {
        phase: String,
        jackpot: Tokens,
        queued: usize,
        players: usize,
        active_players: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        current_question: Option<QuestionView>,
    },
    Error { message: String },
}

impl ServerMessage {
    pub fn new_question(question: QuestionView) -> Self {
        Self::NewQuestion { question }
    }
    pub fn bet_confirmed(question_id: String, receipt: Receipt) -> Self {
        Self::BetConfirmed {
            question_id,
            bets: receipt.stakes,
            new_balance: receipt.balance,
        }
    }
    pub fn bet_rejected(reason: &Rejection) -> Self {
        Self::BetRejected {
            reason: reason.to_string(),
        }
    }
    pub fn balance(tokens: Tokens) -> Self {
        Self::Balance { tokens }
    }
    pub fn eliminated() -> Self {
        Self::Eliminated {
            message: "You have been eliminated from the quiz!".to_string(),
        }
    }
    pub fn game_ended(outcome: Outcome, results: Option<Results>) -> Self {
        Self::GameEnded { outcome, results }
    }
    pub fn question_queued(question_id: ID<Question>, queue_position: usize) -> Self {
        Self::QuestionQueued {
            question_id,
            queue_position,
        }
    }
    pub fn question_live(question_id: ID<Question>) -> Self {
        Self::QuestionLive { question_id }
    }
    pub fn question_rejected(reason: &QuestionError) -> Self {
        Self::QuestionRejected {
            reason: reason.to_string(),
        }
    }
    pub fn ready_for_question(remaining_players: usize) -> Self {
        Self::ReadyForQuestion { remaining_players }
    }
    pub fn error(message: &str) -> Self {
        Self::Error {
            message: message.to_string(),
        }
    }
}

/// Messages a player may send.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayerMessage {
    SubmitBet { question_id: String, bets: Vec<f64> },
    /// UI balance ping, answered by the connection itself.
    Balance,
}

/// Messages the host may send.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostMessage {
    SubmitQuestion(QuestionDraft),
    NewGame,
}
