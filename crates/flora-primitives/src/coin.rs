//! Denominated amounts

use crate::dec::Dec;
use crate::error::PrimitiveError;
use std::fmt;
use std::str::FromStr;

/// Check a denomination against `[a-zA-Z][a-zA-Z0-9/:._-]{2,127}`
pub fn validate_denom(denom: &str) -> Result<(), PrimitiveError> {
    let bytes = denom.as_bytes();
    let valid_len = (3..=128).contains(&bytes.len());
    let valid_head = bytes.first().is_some_and(|b| b.is_ascii_alphabetic());
    let valid_tail = bytes
        .iter()
        .skip(1)
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'/' | b':' | b'.' | b'_' | b'-'));
    if valid_len && valid_head && valid_tail {
        Ok(())
    } else {
        Err(PrimitiveError::InvalidDenom(denom.to_string()))
    }
}

/// Split `"<amount><denom>"` at the first non-amount character
fn split_amount(s: &str, is_amount_char: impl Fn(char) -> bool) -> Option<(&str, &str)> {
    let idx = s.find(|c: char| !is_amount_char(c))?;
    let (amount, denom) = s.split_at(idx);
    (!amount.is_empty()).then_some((amount, denom))
}

/// A single token amount
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Coin {
    /// Denomination
    pub denom: String,
    /// Amount in base units
    #[cfg_attr(feature = "serde", serde(with = "crate::serde_str"))]
    pub amount: u128,
}

impl Coin {
    /// Create a coin
    pub fn new(denom: impl Into<String>, amount: u128) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    /// Check if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

impl fmt::Debug for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Coin({self})")
    }
}

impl FromStr for Coin {
    type Err = PrimitiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (amount, denom) = split_amount(s, |c| c.is_ascii_digit())
            .ok_or_else(|| PrimitiveError::InvalidCoin(s.to_string()))?;
        validate_denom(denom)?;
        let amount = amount
            .parse()
            .map_err(|_| PrimitiveError::InvalidCoin(s.to_string()))?;
        Ok(Coin::new(denom, amount))
    }
}

/// A decimal amount of one denomination, e.g. a per-gas price
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecCoin {
    /// Denomination
    pub denom: String,
    /// Decimal amount
    pub amount: Dec,
}

impl DecCoin {
    /// Parse a comma separated list such as `"0.025petal,1uatom"`.
    /// An empty string yields an empty list.
    pub fn parse_list(s: &str) -> Result<Vec<DecCoin>, PrimitiveError> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl FromStr for DecCoin {
    type Err = PrimitiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (amount, denom) = split_amount(s, |c| c.is_ascii_digit() || c == '.')
            .ok_or_else(|| PrimitiveError::InvalidCoin(s.to_string()))?;
        validate_denom(denom)?;
        Ok(DecCoin {
            denom: denom.to_string(),
            amount: amount.parse()?,
        })
    }
}

/// A list of coins.
///
/// A *valid* list is sorted by denom, has no duplicates and no zero amounts.
/// Lists decoded from transactions are kept verbatim so validation can reject
/// them; use [`Coins::normalized`] to build a valid list from arbitrary input.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Coins(Vec<Coin>);

impl Coins {
    /// Empty list
    pub fn empty() -> Self {
        Coins(Vec::new())
    }

    /// Keep the coins exactly as given
    pub fn from_unchecked(coins: Vec<Coin>) -> Self {
        Coins(coins)
    }

    /// Sort, merge duplicates and drop zero amounts
    pub fn normalized(coins: impl IntoIterator<Item = Coin>) -> Result<Self, PrimitiveError> {
        let mut out: Vec<Coin> = Vec::new();
        let mut coins: Vec<Coin> = coins.into_iter().collect();
        coins.sort_by(|a, b| a.denom.cmp(&b.denom));
        for coin in coins {
            match out.last_mut() {
                Some(last) if last.denom == coin.denom => {
                    last.amount = last
                        .amount
                        .checked_add(coin.amount)
                        .ok_or(PrimitiveError::Overflow)?;
                }
                _ => out.push(coin),
            }
        }
        out.retain(|c| !c.is_zero());
        Ok(Coins(out))
    }

    /// Single-coin list
    pub fn single(denom: impl Into<String>, amount: u128) -> Self {
        let coin = Coin::new(denom, amount);
        if coin.is_zero() {
            Coins::empty()
        } else {
            Coins(vec![coin])
        }
    }

    /// Validate ordering, duplicates, denoms and amounts
    pub fn validate(&self) -> Result<(), PrimitiveError> {
        for (i, coin) in self.0.iter().enumerate() {
            validate_denom(&coin.denom)?;
            if coin.is_zero() {
                return Err(PrimitiveError::InvalidCoin(coin.to_string()));
            }
            if i > 0 && self.0[i - 1].denom >= coin.denom {
                return Err(PrimitiveError::InvalidCoin(format!(
                    "coins not sorted or duplicated: {self}"
                )));
            }
        }
        Ok(())
    }

    /// Check if valid
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Amount of one denom (zero when absent)
    pub fn amount_of(&self, denom: &str) -> u128 {
        self.0
            .iter()
            .filter(|c| c.denom == denom)
            .map(|c| c.amount)
            .sum()
    }

    /// Every amount is zero (or the list is empty)
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(Coin::is_zero)
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of coins
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate coins
    pub fn iter(&self) -> std::slice::Iter<'_, Coin> {
        self.0.iter()
    }

    /// Every denom in `other` is covered by at least as much in `self`
    pub fn is_all_gte(&self, other: &Coins) -> bool {
        other
            .iter()
            .all(|c| self.amount_of(&c.denom) >= c.amount)
    }

    /// `self - other`, `None` if any denom would go negative
    pub fn checked_sub(&self, other: &Coins) -> Option<Coins> {
        let mut out = self.0.clone();
        for coin in other.iter() {
            match out.iter_mut().find(|c| c.denom == coin.denom) {
                Some(c) => c.amount = c.amount.checked_sub(coin.amount)?,
                None if coin.is_zero() => {}
                None => return None,
            }
        }
        out.retain(|c| !c.is_zero());
        Some(Coins(out))
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(Coin::to_string).collect();
        f.write_str(&parts.join(","))
    }
}

impl fmt::Debug for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Coins({self})")
    }
}

impl FromStr for Coins {
    type Err = PrimitiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let coins = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::parse)
            .collect::<Result<Vec<Coin>, _>>()?;
        Coins::normalized(coins)
    }
}

impl<'a> IntoIterator for &'a Coins {
    type Item = &'a Coin;
    type IntoIter = std::slice::Iter<'a, Coin>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coin_parse() {
        let coin: Coin = "1500petal".parse().unwrap();
        assert_eq!(coin, Coin::new("petal", 1500));
        assert!("petal".parse::<Coin>().is_err());
        assert!("10p".parse::<Coin>().is_err());
    }

    #[test]
    fn test_dec_coin_list() {
        let prices = DecCoin::parse_list("0.025petal, 1uatom").unwrap();
        assert_eq!(prices.len(), 2);
        assert_eq!(prices[0].denom, "petal");
        assert_eq!(prices[0].amount.to_string(), "0.025");
        assert!(DecCoin::parse_list("").unwrap().is_empty());
    }

    #[test]
    fn test_coins_validation() {
        let sorted = Coins::from_unchecked(vec![Coin::new("aaa", 1), Coin::new("bbb", 2)]);
        assert!(sorted.is_valid());

        let unsorted = Coins::from_unchecked(vec![Coin::new("bbb", 1), Coin::new("aaa", 2)]);
        assert!(!unsorted.is_valid());

        let zero = Coins::from_unchecked(vec![Coin::new("aaa", 0)]);
        assert!(!zero.is_valid());
        assert!(zero.is_zero());
    }

    #[test]
    fn test_coins_normalized_merges() {
        let coins = Coins::normalized(vec![
            Coin::new("bbb", 1),
            Coin::new("aaa", 2),
            Coin::new("bbb", 3),
            Coin::new("ccc", 0),
        ])
        .unwrap();
        assert_eq!(coins.to_string(), "2aaa,4bbb");
    }

    #[test]
    fn test_coins_sub_and_compare() {
        let have: Coins = "100petal,5uatom".parse().unwrap();
        let need: Coins = "40petal".parse().unwrap();
        assert!(have.is_all_gte(&need));
        assert_eq!(have.checked_sub(&need).unwrap().to_string(), "60petal,5uatom");

        let too_much: Coins = "101petal".parse().unwrap();
        assert!(!have.is_all_gte(&too_much));
        assert!(have.checked_sub(&too_much).is_none());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_coin_json_amount_is_string() {
        let coin = Coin::new("petal", 5);
        let json = serde_json::to_string(&coin).unwrap();
        assert_eq!(json, r#"{"denom":"petal","amount":"5"}"#);

        let big = Coin::new("petal", 100_000_000_000_000_000_000);
        let value = serde_json::to_value(&big).unwrap();
        assert_eq!(value["amount"], "100000000000000000000");
        assert_eq!(serde_json::from_value::<Coin>(value).unwrap(), big);

        assert!(serde_json::from_str::<Coin>(r#"{"denom":"petal","amount":"x"}"#).is_err());
    }
}
