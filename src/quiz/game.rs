use super::*;
use crate::*;
use std::collections::VecDeque;
use std::ops::RangeInclusive;
use std::time::Duration;
use std::time::SystemTime;
use tokio::time::Instant;

/// The question currently open for wagers.
#[derive(Debug)]
pub struct Round {
    seq: u64,
    question: Question,
    started: SystemTime,
    opened: Instant,
}

impl Round {
    fn new(seq: u64, question: Question) -> Self {
        Self {
            seq,
            question,
            started: SystemTime::now(),
            opened: Instant::now(),
        }
    }
    pub fn seq(&self) -> u64 {
        self.seq
    }
    pub fn question(&self) -> &Question {
        &self.question
    }
    pub fn remaining(&self) -> Duration {
        self.question
            .time_limit()
            .saturating_sub(self.opened.elapsed())
    }
    pub fn view(&self) -> QuestionView {
        self.question.view(self.started)
    }
}

#[derive(Debug)]
pub enum Phase {
    /// No round open. Waiting for the host.
    Idle,
    /// A round is open and its deadline is armed.
    Live(Round),
    /// Transient, only observable from inside [`Game::settle`].
    Settling,
    /// Between a settlement and the next queued question.
    Cooldown,
    /// One or zero players survived. Only `new_game` leaves this.
    Ended,
}

/// Where an accepted question went.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Submitted {
    /// Went live at once as round `seq`.
    Live { question: ID<Question>, seq: u64 },
    /// Waits behind a live round or cooldown, 1-based.
    Queued { question: ID<Question>, position: usize },
}

/// The question → wager → settlement state machine.
///
/// Owns the live round, the FIFO of pending questions, the wager ledger and
/// the jackpot. Player records live in the registry and are lent in by the
/// loop whenever a transition needs them. Timers are the loop's business;
/// this type only hands out the round sequence numbers they are tagged with.
#[derive(Debug)]
pub struct Game {
    phase: Phase,
    queue: VecDeque<Question>,
    jackpot: Tokens,
    ledger: Ledger,
    seq: u64,
    settled: usize,
    starting: Tokens,
    limits: RangeInclusive<u64>,
}

impl Game {
    pub fn new(config: &Config) -> Self {
        Self {
            phase: Phase::Idle,
            queue: VecDeque::new(),
            jackpot: Tokens::ZERO,
            ledger: Ledger::default(),
            seq: 0,
            settled: 0,
            starting: config.starting_balance,
            limits: config.min_time_limit..=config.max_time_limit,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }
    pub fn round(&self) -> Option<&Round> {
        match &self.phase {
            Phase::Live(round) => Some(round),
            _ => None,
        }
    }
    pub fn jackpot(&self) -> Tokens {
        self.jackpot
    }
    pub fn queued(&self) -> usize {
        self.queue.len()
    }
    pub fn seq(&self) -> u64 {
        self.seq
    }
    pub fn is_ended(&self) -> bool {
        matches!(self.phase, Phase::Ended)
    }
    pub fn starting_balance(&self) -> Tokens {
        self.starting
    }
    pub fn staked(&self) -> Tokens {
        self.ledger.staked()
    }
    /// Lower-case phase name as reported to the host.
    pub fn stage(&self) -> &'static str {
        match self.phase {
            Phase::Idle if self.settled == 0 => "lobby",
            Phase::Idle => "idle",
            Phase::Live(_) => "live",
            Phase::Settling => "settling",
            Phase::Cooldown => "cooldown",
            Phase::Ended => "ended",
        }
    }

    /// Validates a host draft and either opens a round with it or queues it.
    pub fn submit(&mut self, draft: QuestionDraft) -> Result<Submitted, QuestionError> {
        if self.is_ended() {
            return Err(QuestionError::GameEnded);
        }
        let question = Question::new(draft, self.limits.clone())?;
        let id = question.id();
        match self.phase {
            Phase::Idle => Ok(Submitted::Live {
                question: id,
                seq: self.open(question),
            }),
            _ => {
                self.queue.push_back(question);
                Ok(Submitted::Queued {
                    question: id,
                    position: self.queue.len(),
                })
            }
        }
    }

    /// Records a player's wager on the live round.
    pub fn wager(
        &mut self,
        player: &mut Player,
        question: &str,
        bets: &[f64],
    ) -> Result<Receipt, Rejection> {
        let (open, options) = match &self.phase {
            Phase::Live(round) => (round.question.id(), round.question.options().len()),
            _ => return Err(Rejection::NoActiveRound),
        };
        if open.to_string() != question {
            return Err(Rejection::WrongQuestion {
                got: question.to_string(),
                open: open.to_string(),
            });
        }
        let wager = Wager::parse(bets)?;
        self.ledger.place(player, open, wager, options)
    }

    /// Settles round `seq` if it is still the live one.
    ///
    /// Returns `None` for a stale or repeated deadline. The ledger is closed
    /// before anything else happens, so no wager can slip in afterwards. If
    /// the settlement itself fails, every closed stake is refunded, forfeited
    /// stakes go to the jackpot, and the round is voided.
    pub fn settle(
        &mut self,
        seq: u64,
        players: &mut [&mut Player],
    ) -> Option<Result<Results, HubError>> {
        match &self.phase {
            Phase::Live(round) if round.seq == seq => {}
            _ => return None,
        }
        let round = match std::mem::replace(&mut self.phase, Phase::Settling) {
            Phase::Live(round) => round,
            _ => return Some(Err(HubError::NothingToSettle)),
        };
        let snapshot = self.ledger.close();
        let refunds = snapshot.clone();
        match Settlement::settle(&round.question, snapshot, players, self.jackpot) {
            Ok((results, jackpot)) => {
                self.jackpot = jackpot;
                self.settled += 1;
                self.advance(results.outcome.is_final());
                Some(Ok(results))
            }
            Err(e) => {
                for player in players.iter_mut() {
                    if let Some(wager) = refunds.wager(player.id()) {
                        if let Err(e) = player.credit(wager.total()) {
                            log::error!("[game] refund to {} failed: {}", player.id(), e);
                        }
                    }
                }
                for wager in refunds.forfeited() {
                    match self.jackpot.try_add(wager.total()) {
                        Ok(jackpot) => self.jackpot = jackpot,
                        Err(e) => log::error!("[game] forfeited stake lost: {}", e),
                    }
                }
                self.advance(false);
                Some(Err(e))
            }
        }
    }

    /// Leaves cooldown for round `seq`, opening the next queued question.
    /// Returns the new round's sequence number.
    pub fn resume(&mut self, seq: u64) -> Option<u64> {
        match self.phase {
            Phase::Cooldown if self.seq == seq => match self.queue.pop_front() {
                Some(question) => Some(self.open(question)),
                None => {
                    self.phase = Phase::Idle;
                    None
                }
            },
            _ => None,
        }
    }

    /// Ends the game between rounds when departures leave at most one active
    /// player. Does nothing in the lobby, mid-round, or once ended.
    pub fn conclude(&mut self, players: &mut [&mut Player]) -> Option<Result<Outcome, HubError>> {
        if self.settled == 0 || !matches!(self.phase, Phase::Idle | Phase::Cooldown) {
            return None;
        }
        match Settlement::conclude(players, self.jackpot) {
            Ok((Outcome::Continue, _)) => None,
            Ok((outcome, jackpot)) => {
                self.jackpot = jackpot;
                self.finish();
                Some(Ok(outcome))
            }
            Err(e) => Some(Err(e)),
        }
    }

    /// Starts a fresh game after the last one ended, reactivating `players`.
    pub fn new_game(&mut self, players: &mut [&mut Player]) -> bool {
        if !self.is_ended() {
            return false;
        }
        self.phase = Phase::Idle;
        self.queue.clear();
        self.ledger.close();
        self.settled = 0;
        for player in players.iter_mut() {
            player.reset(self.starting);
        }
        true
    }

    /// Detaches a departing player's stake from the open round. It is pooled
    /// into the jackpot when the round settles.
    pub fn forfeit(&mut self, user: &UserId) -> Option<Tokens> {
        self.ledger.forfeit(user)
    }

    fn open(&mut self, question: Question) -> u64 {
        self.seq += 1;
        self.ledger.open(question.id());
        self.phase = Phase::Live(Round::new(self.seq, question));
        self.seq
    }
    fn advance(&mut self, ended: bool) {
        match (ended, self.queue.is_empty()) {
            (true, _) => self.finish(),
            (false, true) => self.phase = Phase::Idle,
            (false, false) => self.phase = Phase::Cooldown,
        }
    }
    fn finish(&mut self) {
        self.phase = Phase::Ended;
        self.queue.clear();
    }
}
