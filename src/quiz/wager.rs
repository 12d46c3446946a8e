use crate::*;

/// One player's stake vector for one round, one entry per offered option.
#[derive(Debug, Clone, PartialEq)]
pub struct Wager {
    stakes: Vec<Tokens>,
}

impl Wager {
    /// Converts wire amounts, rejecting negative or non-finite entries.
    pub fn parse(bets: &[f64]) -> Result<Self, Rejection> {
        bets.iter()
            .map(|&b| Tokens::try_from(b))
            .collect::<Result<Vec<_>, _>>()
            .map(Self::from)
            .map_err(Rejection::from)
    }
    /// An absent wager: nothing on any of `options` options.
    pub fn empty(options: usize) -> Self {
        Self::from(vec![Tokens::ZERO; options])
    }
    pub fn stakes(&self) -> &[Tokens] {
        &self.stakes
    }
    pub fn total(&self) -> Tokens {
        self.stakes.iter().sum()
    }
    /// Stake on the correct option, and the sum of stakes on every other option.
    pub fn split(&self, correct: usize) -> (Tokens, Tokens) {
        self.stakes
            .iter()
            .enumerate()
            .fold((Tokens::ZERO, Tokens::ZERO), |(right, wrong), (i, &s)| {
                match i == correct {
                    true => (right.plus(s), wrong),
                    false => (right, wrong.plus(s)),
                }
            })
    }
}

impl From<Vec<Tokens>> for Wager {
    fn from(stakes: Vec<Tokens>) -> Self {
        Self { stakes }
    }
}

impl From<Wager> for Vec<Tokens> {
    fn from(wager: Wager) -> Self {
        wager.stakes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn split_separates_correct_from_wrong() {
        let wager = Wager::parse(&[10.0, 5.0, 2.5]).unwrap();
        assert_eq!(wager.total(), Tokens::from_cents(1750));
        assert_eq!(
            wager.split(1),
            (Tokens::whole(5), Tokens::from_cents(1250))
        );
    }
    #[test]
    fn parse_rejects_negative_stakes() {
        assert!(matches!(
            Wager::parse(&[10.0, -1.0]),
            Err(Rejection::InvalidStake(TokensError::Negative(_)))
        ));
    }
    #[test]
    fn empty_wager_stakes_nothing() {
        let wager = Wager::empty(3);
        assert_eq!(wager.stakes().len(), 3);
        assert_eq!(wager.split(0), (Tokens::ZERO, Tokens::ZERO));
    }
}
