use super::*;
use crate::*;
use std::collections::HashMap;

/// Wagers recorded against a closed round, taken in one piece at the deadline.
///
/// Holds the wagers of seated players by user, plus the stakes of players who
/// left mid-round. Those belong to nobody any more and pool into the jackpot.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    wagers: HashMap<UserId, Wager>,
    forfeited: Vec<Wager>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.wagers.len()
    }
    pub fn is_empty(&self) -> bool {
        self.wagers.is_empty() && self.forfeited.is_empty()
    }
    pub fn wager(&self, user: &UserId) -> Option<&Wager> {
        self.wagers.get(user)
    }
    /// Removes `user`'s wager so it is settled exactly once.
    pub fn take(&mut self, user: &UserId) -> Option<Wager> {
        self.wagers.remove(user)
    }
    /// Stakes left behind by departed players.
    pub fn forfeited(&self) -> &[Wager] {
        &self.forfeited
    }
}

/// What an accepted wager left behind.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub stakes: Vec<Tokens>,
    pub balance: Tokens,
}

/// Wagers of the round currently open for bets.
///
/// Stakes are debited from the player's balance the moment they are accepted,
/// so the ledger holds value that belongs to neither balances nor jackpot until
/// settlement. A departing player's stake stays on the book as forfeited.
/// Once [`Ledger::close`] runs, every further placement is refused.
#[derive(Debug, Default)]
pub struct Ledger {
    open: Option<ID<Question>>,
    book: Snapshot,
}

impl Ledger {
    /// Opens a fresh book for `question`, discarding anything left over.
    pub fn open(&mut self, question: ID<Question>) {
        self.open = Some(question);
        self.book = Snapshot::default();
    }
    /// Closes the book and hands over every wager it held.
    pub fn close(&mut self) -> Snapshot {
        self.open = None;
        std::mem::take(&mut self.book)
    }
    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }
    pub fn wager(&self, user: &UserId) -> Option<&Wager> {
        self.book.wager(user)
    }
    /// Total value currently held on the book, forfeited stakes included.
    pub fn staked(&self) -> Tokens {
        self.book
            .wagers
            .values()
            .chain(self.book.forfeited.iter())
            .map(Wager::total)
            .sum()
    }
    /// Detaches a departing player's wager from them. The stake stays on the
    /// book and is pooled into the jackpot at settlement.
    pub fn forfeit(&mut self, user: &UserId) -> Option<Tokens> {
        let wager = self.book.wagers.remove(user)?;
        let total = wager.total();
        self.book.forfeited.push(wager);
        Some(total)
    }
    /// Records `wager` for `player`, replacing any earlier wager this round.
    ///
    /// The earlier stake is credited back before the new one is checked and
    /// debited, so a resubmission never double-debits. On rejection nothing
    /// changes.
    pub fn place(
        &mut self,
        player: &mut Player,
        question: ID<Question>,
        wager: Wager,
        options: usize,
    ) -> Result<Receipt, Rejection> {
        if self.open != Some(question) {
            return Err(Rejection::NoActiveRound);
        }
        if !player.is_active() {
            return Err(Rejection::Eliminated(player.id().clone()));
        }
        if wager.stakes().len() != options {
            return Err(Rejection::StakeCount {
                expected: options,
                got: wager.stakes().len(),
            });
        }
        let total = wager.total();
        let previous = self
            .book
            .wager(player.id())
            .map(Wager::total)
            .unwrap_or_default();
        let available = player.balance().try_add(previous)?;
        let balance = available
            .try_sub(total)
            .map_err(|_| Rejection::InsufficientBalance { total, available })?;
        player.set_balance(balance);
        let receipt = Receipt {
            stakes: wager.stakes().to_vec(),
            balance,
        };
        self.book.wagers.insert(player.id().clone(), wager);
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    fn player(balance: u64) -> Player {
        Player::new("p1".into(), "Ann".into(), Purse::default(), Tokens::whole(balance))
    }
    fn stakes(xs: &[f64]) -> Wager {
        Wager::parse(xs).unwrap()
    }
    #[test]
    fn accepted_wager_debits_immediately() {
        let q = ID::default();
        let mut ledger = Ledger::default();
        let mut p = player(50);
        ledger.open(q);
        let receipt = ledger.place(&mut p, q, stakes(&[20.0, 10.0]), 2).unwrap();
        assert_eq!(receipt.balance, Tokens::whole(20));
        assert_eq!(p.balance(), Tokens::whole(20));
        assert_eq!(ledger.staked(), Tokens::whole(30));
    }
    #[test]
    fn resubmission_replaces_without_double_debit() {
        let q = ID::default();
        let mut ledger = Ledger::default();
        let mut p = player(50);
        ledger.open(q);
        ledger.place(&mut p, q, stakes(&[40.0, 0.0]), 2).unwrap();
        let receipt = ledger.place(&mut p, q, stakes(&[0.0, 50.0]), 2).unwrap();
        assert_eq!(receipt.balance, Tokens::ZERO);
        assert_eq!(ledger.staked(), Tokens::whole(50));
        assert_eq!(p.balance().try_add(ledger.staked()).unwrap(), Tokens::whole(50));
    }
    #[test]
    fn overdraw_is_rejected_without_change() {
        let q = ID::default();
        let mut ledger = Ledger::default();
        let mut p = player(50);
        ledger.open(q);
        ledger.place(&mut p, q, stakes(&[10.0, 0.0]), 2).unwrap();
        let err = ledger.place(&mut p, q, stakes(&[30.0, 30.0]), 2).unwrap_err();
        assert_eq!(
            err,
            Rejection::InsufficientBalance {
                total: Tokens::whole(60),
                available: Tokens::whole(50),
            }
        );
        assert_eq!(p.balance(), Tokens::whole(40));
        assert_eq!(ledger.wager(p.id()), Some(&stakes(&[10.0, 0.0])));
    }
    #[test]
    fn wrong_shape_and_eliminated_are_rejected() {
        let q = ID::default();
        let mut ledger = Ledger::default();
        let mut p = player(50);
        ledger.open(q);
        assert!(matches!(
            ledger.place(&mut p, q, stakes(&[1.0, 1.0, 1.0]), 2),
            Err(Rejection::StakeCount { expected: 2, got: 3 })
        ));
        p.eliminate();
        assert!(matches!(
            ledger.place(&mut p, q, stakes(&[1.0, 1.0]), 2),
            Err(Rejection::Eliminated(_))
        ));
        assert_eq!(p.balance(), Tokens::whole(50));
    }
    #[test]
    fn closed_book_refuses_late_wagers() {
        let q = ID::default();
        let mut ledger = Ledger::default();
        let mut p = player(50);
        ledger.open(q);
        ledger.place(&mut p, q, stakes(&[5.0, 5.0]), 2).unwrap();
        let snapshot = ledger.close();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(
            ledger.place(&mut p, q, stakes(&[5.0, 5.0]), 2),
            Err(Rejection::NoActiveRound)
        );
        assert_eq!(p.balance(), Tokens::whole(40));
        assert_eq!(ledger.staked(), Tokens::ZERO);
    }
    #[test]
    fn forfeited_stake_stays_on_the_book() {
        let q = ID::default();
        let mut ledger = Ledger::default();
        let mut p = player(50);
        ledger.open(q);
        ledger.place(&mut p, q, stakes(&[5.0, 15.0]), 2).unwrap();
        assert_eq!(ledger.forfeit(p.id()), Some(Tokens::whole(20)));
        assert_eq!(ledger.forfeit(p.id()), None);
        assert_eq!(ledger.wager(p.id()), None);
        assert_eq!(ledger.staked(), Tokens::whole(20));
        let snapshot = ledger.close();
        assert_eq!(snapshot.len(), 0);
        assert_eq!(snapshot.forfeited(), &[stakes(&[5.0, 15.0])]);
    }
}
