use crate::TokensError;
use std::fmt::Display;
use std::fmt::Formatter;
use std::iter::Sum;
use std::str::FromStr;

/// Hundredths per whole token.
const SCALE: u64 = 100;

/// Non-negative token amount in fixed-point hundredths.
///
/// Settlement only ever moves value between balances and the jackpot, so
/// amounts must add and subtract exactly. Floats would drift; this doesn't.
/// On the wire an amount is a plain JSON number such as `12.5`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tokens(u64);

impl Tokens {
    pub const ZERO: Self = Self(0);

    pub const fn whole(n: u64) -> Self {
        Self(n * SCALE)
    }
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }
    pub const fn cents(self) -> u64 {
        self.0
    }
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }
    /// Adds, saturating at the representable maximum.
    pub fn plus(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
    /// Adds, or reports the overflow.
    pub fn try_add(self, rhs: Self) -> Result<Self, TokensError> {
        self.checked_add(rhs)
            .ok_or(TokensError::Overflow { lhs: self, rhs })
    }
    /// Subtracts, or reports the underflow that would have made a balance negative.
    pub fn try_sub(self, rhs: Self) -> Result<Self, TokensError> {
        self.checked_sub(rhs)
            .ok_or(TokensError::Underflow { lhs: self, rhs })
    }
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / SCALE as f64
    }
}

impl TryFrom<f64> for Tokens {
    type Error = TokensError;
    fn try_from(x: f64) -> Result<Self, Self::Error> {
        let cents = (x * SCALE as f64).round();
        match x {
            x if !x.is_finite() => Err(TokensError::NotFinite),
            x if x < 0.0 => Err(TokensError::Negative(x)),
            _ if cents >= u64::MAX as f64 => Err(TokensError::TooLarge(x)),
            _ => Ok(Self(cents as u64)),
        }
    }
}

impl FromStr for Tokens {
    type Err = TokensError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<f64>()
            .map_err(|_| TokensError::Unparsable(s.to_string()))
            .and_then(Self::try_from)
    }
}

impl Display for Tokens {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.0 % SCALE {
            0 => write!(f, "{}", self.0 / SCALE),
            r => write!(f, "{}.{:02}", self.0 / SCALE, r),
        }
    }
}

impl Sum for Tokens {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Self::plus)
    }
}
impl<'a> Sum<&'a Tokens> for Tokens {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl serde::Serialize for Tokens {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_f64(self.as_f64())
    }
}
impl<'de> serde::Deserialize<'de> for Tokens {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        f64::deserialize(deserializer)
            .and_then(|x| Self::try_from(x).map_err(serde::de::Error::custom))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn parses_and_rounds_to_hundredths() {
        assert_eq!(Tokens::try_from(12.5).unwrap(), Tokens::from_cents(1250));
        assert_eq!(Tokens::try_from(0.004).unwrap(), Tokens::ZERO);
        assert_eq!(Tokens::try_from(0.005).unwrap(), Tokens::from_cents(1));
        assert_eq!("7".parse::<Tokens>().unwrap(), Tokens::whole(7));
    }
    #[test]
    fn rejects_negative_and_non_finite() {
        assert!(Tokens::try_from(-1.0).is_err());
        assert!(Tokens::try_from(f64::NAN).is_err());
        assert!(Tokens::try_from(f64::INFINITY).is_err());
        assert!(Tokens::try_from(1e300).is_err());
        assert!("ten".parse::<Tokens>().is_err());
    }
    #[test]
    fn subtraction_never_goes_negative() {
        let five = Tokens::whole(5);
        assert_eq!(five.try_sub(Tokens::whole(2)).unwrap(), Tokens::whole(3));
        assert!(five.try_sub(Tokens::whole(6)).is_err());
    }
    #[test]
    fn displays_like_a_decimal() {
        assert_eq!(Tokens::whole(50).to_string(), "50");
        assert_eq!(Tokens::from_cents(1205).to_string(), "12.05");
    }
    #[test]
    fn serializes_as_json_number() {
        let json = serde_json::to_string(&Tokens::from_cents(250)).unwrap();
        assert_eq!(json, "2.5");
        let back: Tokens = serde_json::from_str("2.5").unwrap();
        assert_eq!(back, Tokens::from_cents(250));
        assert!(serde_json::from_str::<Tokens>("-3").is_err());
    }
    #[test]
    fn sums_exactly() {
        let total: Tokens = [0.1, 0.2, 0.3]
            .into_iter()
            .map(|x| Tokens::try_from(x).unwrap())
            .sum();
        assert_eq!(total, Tokens::from_cents(60));
    }
}
