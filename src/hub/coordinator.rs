use super::*;
use crate::accounts::*;
use crate::quiz::*;
use crate::*;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::WeakSender;

/// The single coordinating loop.
///
/// Sole owner of the registry, the game and the jackpot. Handles one
/// [`Event`] at a time, synchronously; the only `.await` is waiting for the
/// next event. Peers are reached through their outboxes, which never block,
/// and the accounts collaborator only from spawned tasks.
pub struct Coordinator {
    config: Arc<Config>,
    registry: Registry,
    game: Game,
    timer: Timer,
    accounts: Arc<dyn Accounts>,
    rx: mpsc::Receiver<Event>,
}

impl Coordinator {
    pub fn new(
        config: Arc<Config>,
        accounts: Arc<dyn Accounts>,
        rx: mpsc::Receiver<Event>,
        tx: WeakSender<Event>,
    ) -> Self {
        Self {
            game: Game::new(&config),
            registry: Registry::default(),
            timer: Timer::new(tx),
            config,
            accounts,
            rx,
        }
    }

    /// Runs until every [`HubHandle`] is dropped.
    pub async fn run(mut self) {
        log::info!("[hub] coordinating loop started");
        while let Some(event) = self.rx.recv().await {
            log::debug!("[hub] {}", event);
            self.handle(event);
        }
        log::info!("[hub] all handles dropped, loop exiting");
    }

    pub fn handle(&mut self, event: Event) {
        match event {
            Event::Join {
                user,
                name,
                outbox,
                purse,
            } => self.join(user, name, outbox, purse),
            Event::Leave { user, conn } => self.leave(user, conn),
            Event::HostJoin { outbox } => self.host_join(outbox),
            Event::HostLeave { conn } => self.host_leave(conn),
            Event::SubmitQuestion(draft) => self.submit(draft),
            Event::SubmitWager {
                user,
                question,
                bets,
            } => self.wager(user, question, bets),
            Event::NewGame => self.new_game(),
            Event::Deadline { round } => self.settle(round),
            Event::Cooldown { round } => self.resume(round),
            Event::Evict { user, conn } => self.evict(user, conn),
        }
    }
}

// peers
impl Coordinator {
    fn join(&mut self, user: UserId, name: String, outbox: Outbox, purse: Purse) {
        if self.registry.contains(&user) {
            if let Some(old) = self.registry.rebind(&user, outbox, purse) {
                old.close();
            }
            self.refund_entry(&user);
            log::info!("[hub] {} reconnected", user);
            if self.registry.player(&user).is_some_and(|p| !p.is_active()) {
                self.evict_later(&user);
            }
        } else if self.game.is_ended() {
            log::info!("[hub] {} turned away, game has ended", user);
            if let Some(json) = Protocol::encode(&ServerMessage::error("the game has ended")) {
                outbox.deliver(json);
            }
            self.refund_entry(&user);
            return;
        } else {
            let player = Player::new(user.clone(), name, purse, self.game.starting_balance());
            log::info!(
                "[hub] {} ({}) joined with {} tokens ({} players)",
                user,
                player.name(),
                player.balance(),
                self.registry.len() + 1
            );
            self.registry.sit(player, outbox);
        }
        self.game_state(&user);
    }

    fn leave(&mut self, user: UserId, conn: ID<Outbox>) {
        let Some(seat) = self.registry.leave(&user, conn) else {
            log::debug!("[hub] stale leave from {}", user);
            return;
        };
        if let Some(stake) = self.game.forfeit(&user) {
            log::info!("[hub] {} left mid-round, forfeiting {} to the jackpot", user, stake);
        }
        log::info!(
            "[hub] {} left with {} tokens ({} players)",
            user,
            seat.player.balance(),
            self.registry.len()
        );
        self.attrition();
    }

    /// Closes an eliminated player's transport once their grace has run out,
    /// unless they reconnected or a new game brought them back.
    fn evict(&self, user: UserId, conn: ID<Outbox>) {
        let current = self.registry.outbox(&user).map(Outbox::id) == Some(conn);
        let eliminated = self.registry.player(&user).is_some_and(|p| !p.is_active());
        match (current, eliminated) {
            (true, true) => {
                log::info!("[hub] {} evicted after elimination", user);
                self.registry.close(&user);
            }
            _ => log::debug!("[hub] eviction of {} no longer applies", user),
        }
    }

    fn host_join(&mut self, outbox: Outbox) {
        match self.registry.host_join(outbox) {
            Some(old) => {
                old.close();
                log::info!("[hub] host replaced");
            }
            None => log::info!("[hub] host connected"),
        }
        self.host_state();
    }

    fn host_leave(&mut self, conn: ID<Outbox>) {
        match self.registry.host_leave(conn) {
            true => log::info!("[hub] host disconnected"),
            false => log::debug!("[hub] stale host leave"),
        }
    }
}

// rounds
impl Coordinator {
    fn submit(&mut self, draft: QuestionDraft) {
        match self.game.submit(draft) {
            Ok(Submitted::Live { seq, .. }) => self.go_live(seq),
            Ok(Submitted::Queued { question, position }) => {
                log::info!("[hub] question {} queued at {}", question, position);
                self.registry
                    .notify_host(&ServerMessage::question_queued(question, position));
            }
            Err(e) => {
                log::warn!("[hub] question rejected: {}", e);
                self.registry
                    .notify_host(&ServerMessage::question_rejected(&e));
            }
        }
    }

    fn go_live(&mut self, seq: u64) {
        let Some(round) = self.game.round() else {
            return;
        };
        let view = round.view();
        let id = round.question().id();
        let limit = round.question().time_limit();
        log::info!(
            "[hub] round #{} live for {}s: {}",
            seq,
            limit.as_secs(),
            round.question().prompt()
        );
        self.registry
            .broadcast_active(&ServerMessage::new_question(view));
        self.registry.notify_host(&ServerMessage::question_live(id));
        self.timer.arm(limit, Event::Deadline { round: seq });
    }

    fn wager(&mut self, user: UserId, question: String, bets: Vec<f64>) {
        let Some(player) = self.registry.player_mut(&user) else {
            log::warn!("[hub] wager from unknown player {}", user);
            return;
        };
        let reply = match self.game.wager(player, &question, &bets) {
            Ok(receipt) => {
                log::debug!("[hub] {} staked {:?}", user, receipt.stakes);
                ServerMessage::bet_confirmed(question, receipt)
            }
            Err(e) => {
                log::debug!("[hub] {} wager rejected: {}", user, e);
                ServerMessage::bet_rejected(&e)
            }
        };
        self.registry.unicast(&user, &reply);
    }

    fn settle(&mut self, round: u64) {
        let settled = self.game.settle(round, &mut self.registry.players_mut());
        match settled {
            None => log::debug!("[hub] deadline for round #{} is stale", round),
            Some(Ok(results)) => self.publish(results),
            Some(Err(e)) => {
                log::error!("[hub] round #{} voided, stakes refunded: {}", round, e);
                self.registry
                    .broadcast(&ServerMessage::error("round voided, stakes refunded"));
                self.game_states();
                self.after_round();
            }
        }
    }

    fn publish(&mut self, results: Results) {
        log::info!(
            "[hub] results: {} eliminated, {} remaining, jackpot {}",
            results.eliminated_players.len(),
            results.remaining_players,
            results.jackpot
        );
        let msg = ServerMessage::Results(results.clone());
        self.registry.broadcast(&msg);
        self.registry.notify_host(&msg);
        for user in results.eliminated_players.iter() {
            self.registry.unicast(user, &ServerMessage::eliminated());
            self.evict_later(user);
        }
        match results.outcome.clone() {
            Outcome::Continue => self.after_round(),
            outcome => self.finish(outcome, Some(results)),
        }
    }

    fn after_round(&mut self) {
        match self.game.phase() {
            Phase::Cooldown => {
                let round = self.game.seq();
                self.timer
                    .arm(self.config.cooldown(), Event::Cooldown { round });
            }
            Phase::Idle => self
                .registry
                .notify_host(&ServerMessage::ready_for_question(self.registry.active())),
            _ => {}
        }
    }

    fn resume(&mut self, round: u64) {
        match self.game.resume(round) {
            Some(seq) => self.go_live(seq),
            None => log::debug!("[hub] cooldown after round #{} is stale", round),
        }
    }
}

// game boundaries
impl Coordinator {
    fn attrition(&mut self) {
        match self.game.conclude(&mut self.registry.players_mut()) {
            None => {}
            Some(Ok(outcome)) => {
                log::info!("[hub] departures ended the game");
                self.finish(outcome, None);
            }
            Some(Err(e)) => log::error!("[hub] could not conclude game: {}", e),
        }
    }

    fn finish(&mut self, outcome: Outcome, results: Option<Results>) {
        self.timer.clear();
        match &outcome {
            Outcome::Winner { player, prize } => {
                log::info!("[hub] {} wins the jackpot of {}", player, prize);
                self.cash_out(player);
            }
            Outcome::House { retained } => {
                log::info!("[hub] no survivors, house keeps {}", retained)
            }
            Outcome::Continue => {}
        }
        let msg = ServerMessage::game_ended(outcome, results);
        self.registry.broadcast(&msg);
        self.registry.notify_host(&msg);
    }

    fn new_game(&mut self) {
        if !self.game.new_game(&mut self.registry.players_mut()) {
            self.registry.notify_host(&ServerMessage::error(
                "a new game can only start once the current one has ended",
            ));
            return;
        }
        log::info!("[hub] new game with {} players", self.registry.len());
        self.timer.clear();
        self.game_states();
        self.host_state();
    }
}

// snapshots and side effects
impl Coordinator {
    fn current_question(&self) -> Option<QuestionView> {
        self.open_round().map(Round::view)
    }

    fn open_round(&self) -> Option<&Round> {
        self.game.round().filter(|r| !r.remaining().is_zero())
    }

    fn game_state(&self, user: &UserId) {
        if let Some(player) = self.registry.player(user) {
            let msg = ServerMessage::GameState {
                game_active: !self.game.is_ended(),
                jackpot: self.game.jackpot(),
                tokens: player.balance(),
                is_active: player.is_active(),
                current_question: self.current_question(),
                remaining_ms: self
                    .open_round()
                    .map(|r| r.remaining().as_millis() as u64),
            };
            self.registry.unicast(user, &msg);
        }
    }

    fn game_states(&self) {
        self.registry
            .players()
            .for_each(|p| self.game_state(p.id()));
    }

    fn host_state(&self) {
        self.registry.notify_host(&ServerMessage::HostState {
            phase: self.game.stage().to_string(),
            jackpot: self.game.jackpot(),
            queued: self.game.queued(),
            players: self.registry.len(),
            active_players: self.registry.active(),
            current_question: self.current_question(),
        });
    }

    /// Schedules an eliminated player's eviction after the grace period,
    /// giving the elimination notice time to flush.
    fn evict_later(&self, user: &UserId) {
        if let Some(conn) = self.registry.outbox(user).map(Outbox::id) {
            let event = Event::Evict {
                user: user.clone(),
                conn,
            };
            self.timer.schedule(self.config.elimination_grace(), event);
        }
    }

    /// Credits a winner's final game balance to their persistent account.
    fn cash_out(&self, user: &UserId) {
        if let Some(balance) = self.registry.player(user).map(Player::balance) {
            self.credit(user, balance, "cash-out");
        }
    }

    /// Returns an entry fee for a session that did not take a new seat.
    fn refund_entry(&self, user: &UserId) {
        if !self.config.entry_fee.is_zero() {
            self.credit(user, self.config.entry_fee, "entry refund");
        }
    }

    fn credit(&self, user: &UserId, amount: Tokens, what: &'static str) {
        let accounts = self.accounts.clone();
        let user = user.clone();
        tokio::spawn(async move {
            match accounts.adjust(&user, Adjustment::Credit(amount)).await {
                Ok(total) => log::info!("[accounts] {} of {} to {} (now {})", what, amount, user, total),
                Err(e) => log::error!("[accounts] {} of {} to {} failed: {}", what, amount, user, e),
            }
        });
    }
}
