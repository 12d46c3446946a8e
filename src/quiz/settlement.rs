use super::*;
use crate::*;
use std::collections::BTreeMap;

/// How a settlement left the game.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// More than one player survives.
    Continue,
    /// A lone survivor took the whole jackpot.
    Winner { player: UserId, prize: Tokens },
    /// Nobody survived; the house keeps the jackpot.
    House { retained: Tokens },
}

impl Outcome {
    pub fn is_final(&self) -> bool {
        !matches!(self, Self::Continue)
    }
}

/// One player's line in a round's results.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PlayerResult {
    /// Stakes as recorded; empty when the player never bet.
    pub bets: Vec<Tokens>,
    pub won: bool,
    pub tokens_returned: Tokens,
    pub tokens_lost: Tokens,
    pub new_balance: Tokens,
}

/// Everything a round's settlement decided. Broadcast verbatim.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Results {
    pub question_id: ID<Question>,
    pub correct_index: usize,
    pub eliminated_players: Vec<UserId>,
    pub remaining_players: usize,
    /// Jackpot after this round's contributions, before any award.
    pub jackpot: Tokens,
    /// Stakes left on the book by players who departed mid-round.
    pub forfeited: Tokens,
    pub player_results: BTreeMap<UserId, PlayerResult>,
    pub outcome: Outcome,
}

/// Planned effect on one player, computed before anything is touched.
struct Entry {
    index: usize,
    survived: bool,
    result: PlayerResult,
}

/// Wager settlement and jackpot accounting.
///
/// Both operations compute their full effect first and only then write it
/// back, so an arithmetic failure leaves every balance and the jackpot as
/// they were.
pub struct Settlement;

impl Settlement {
    /// Settles a closed round for every active player.
    ///
    /// A player with nothing on the correct option is eliminated and keeps no
    /// stake back. A survivor gets the correct-option stake refunded. Every
    /// wrong-option stake feeds the jackpot, as does every stake forfeited by a
    /// player who left mid-round. A lone survivor then takes the
    /// jackpot; with no survivors the house does. Returns the results and the
    /// jackpot left afterwards.
    pub fn settle(
        question: &Question,
        mut wagers: Snapshot,
        players: &mut [&mut Player],
        jackpot: Tokens,
    ) -> Result<(Results, Tokens), HubError> {
        let correct = question.correct();
        let mut pot = jackpot;
        let mut plan = Vec::new();
        for (index, player) in players.iter().enumerate() {
            if !player.is_active() {
                continue;
            }
            let wager = wagers.take(player.id());
            let (right, wrong) = wager
                .as_ref()
                .map(|w| w.split(correct))
                .unwrap_or_default();
            let survived = !right.is_zero();
            pot = pot.try_add(wrong)?;
            let new_balance = match survived {
                true => player.balance().try_add(right)?,
                false => player.balance(),
            };
            plan.push(Entry {
                index,
                survived,
                result: PlayerResult {
                    bets: wager.map(Vec::from).unwrap_or_default(),
                    won: survived,
                    tokens_returned: if survived { right } else { Tokens::ZERO },
                    tokens_lost: wrong,
                    new_balance,
                },
            });
        }
        let mut forfeited = Tokens::ZERO;
        for wager in wagers.forfeited() {
            forfeited = forfeited.try_add(wager.total())?;
        }
        pot = pot.try_add(forfeited)?;
        let survivors = plan.iter().filter(|e| e.survived).count();
        let pooled = pot;
        let outcome = match survivors {
            0 => {
                pot = Tokens::ZERO;
                Outcome::House { retained: pooled }
            }
            1 => {
                let entry = plan
                    .iter_mut()
                    .find(|e| e.survived)
                    .ok_or(HubError::NothingToSettle)?;
                entry.result.new_balance = entry.result.new_balance.try_add(pooled)?;
                entry.result.tokens_returned = entry.result.tokens_returned.try_add(pooled)?;
                pot = Tokens::ZERO;
                Outcome::Winner {
                    player: players[entry.index].id().clone(),
                    prize: pooled,
                }
            }
            _ => Outcome::Continue,
        };
        let mut results = Results {
            question_id: question.id(),
            correct_index: correct,
            eliminated_players: Vec::new(),
            remaining_players: survivors,
            jackpot: pooled,
            forfeited,
            player_results: BTreeMap::new(),
            outcome,
        };
        for entry in plan {
            let player = &mut players[entry.index];
            player.set_balance(entry.result.new_balance);
            if !entry.survived {
                player.eliminate();
                results.eliminated_players.push(player.id().clone());
            }
            results
                .player_results
                .insert(player.id().clone(), entry.result);
        }
        Ok((results, pot))
    }

    /// Ends a game outside a settlement, when departures leave at most one
    /// active player between rounds. Returns the outcome and the jackpot left.
    pub fn conclude(
        players: &mut [&mut Player],
        jackpot: Tokens,
    ) -> Result<(Outcome, Tokens), HubError> {
        let mut active = players.iter_mut().filter(|p| p.is_active());
        match (active.next(), active.next()) {
            (None, _) => Ok((Outcome::House { retained: jackpot }, Tokens::ZERO)),
            (Some(winner), None) => {
                winner.credit(jackpot)?;
                Ok((
                    Outcome::Winner {
                        player: winner.id().clone(),
                        prize: jackpot,
                    },
                    Tokens::ZERO,
                ))
            }
            (Some(_), Some(_)) => Ok((Outcome::Continue, jackpot)),
        }
    }
}
