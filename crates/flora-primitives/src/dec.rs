//! Fixed-point decimal with 18 fractional digits

use crate::error::PrimitiveError;
use std::fmt;
use std::str::FromStr;

/// Number of fractional digits carried by [`Dec`]
pub const PRECISION: u32 = 18;

const ONE: u128 = 10u128.pow(PRECISION);

/// Non-negative fixed-point decimal (`raw / 10^18`).
///
/// Used for gas prices, where sub-unit precision matters
/// (`0.000000001petal` per gas is a realistic floor).
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Dec(u128);

impl Dec {
    /// Zero
    pub const ZERO: Dec = Dec(0);

    /// One
    pub const ONE: Dec = Dec(ONE);

    /// Build from the raw 10^-18 scaled representation
    pub const fn from_raw(raw: u128) -> Self {
        Dec(raw)
    }

    /// Build from a whole number
    pub fn from_int(value: u128) -> Result<Self, PrimitiveError> {
        value.checked_mul(ONE).map(Dec).ok_or(PrimitiveError::Overflow)
    }

    /// Raw scaled value
    pub fn raw(&self) -> u128 {
        self.0
    }

    /// Check if zero
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// `ceil(self * gas)` as an integer amount
    pub fn mul_gas_ceil(&self, gas: u64) -> Result<u128, PrimitiveError> {
        let gas = gas as u128;
        let whole = (self.0 / ONE)
            .checked_mul(gas)
            .ok_or(PrimitiveError::Overflow)?;
        // frac < 10^18 and gas < 2^64, so the product stays below 2^128
        let frac = (self.0 % ONE) * gas;
        let frac_ceil = frac / ONE + u128::from(frac % ONE != 0);
        whole.checked_add(frac_ceil).ok_or(PrimitiveError::Overflow)
    }
}

impl FromStr for Dec {
    type Err = PrimitiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PrimitiveError::InvalidDecimal(s.to_string());
        let s = s.trim();
        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if frac_part.len() > PRECISION as usize {
            return Err(invalid());
        }
        let all_digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_part) || !all_digits(frac_part) {
            return Err(invalid());
        }

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| invalid())?
        };
        let frac: u128 = if frac_part.is_empty() {
            0
        } else {
            let scale = 10u128.pow(PRECISION - frac_part.len() as u32);
            frac_part.parse::<u128>().map_err(|_| invalid())? * scale
        };

        whole
            .checked_mul(ONE)
            .and_then(|w| w.checked_add(frac))
            .map(Dec)
            .ok_or(PrimitiveError::Overflow)
    }
}

impl fmt::Display for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / ONE;
        let frac = self.0 % ONE;
        if frac == 0 {
            return write!(f, "{whole}");
        }
        let digits = format!("{:018}", frac);
        write!(f, "{whole}.{}", digits.trim_end_matches('0'))
    }
}

impl fmt::Debug for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dec({self})")
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use super::Dec;
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    impl Serialize for Dec {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_str(self)
        }
    }

    impl<'de> Deserialize<'de> for Dec {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(de::Error::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let d: Dec = "0.000000001".parse().unwrap();
        assert_eq!(d.raw(), 1_000_000_000);
        assert_eq!(d.to_string(), "0.000000001");

        let d: Dec = "12.5".parse().unwrap();
        assert_eq!(d.to_string(), "12.5");
        assert_eq!("7".parse::<Dec>().unwrap(), Dec::from_int(7).unwrap());
        assert_eq!(".5".parse::<Dec>().unwrap().to_string(), "0.5");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<Dec>().is_err());
        assert!("1.2.3".parse::<Dec>().is_err());
        assert!("-1".parse::<Dec>().is_err());
        assert!("0.0000000000000000001".parse::<Dec>().is_err());
        assert!("abc".parse::<Dec>().is_err());
    }

    #[test]
    fn test_mul_gas_ceil() {
        let price: Dec = "0.000000001".parse().unwrap();
        // 200_000 * 1e-9 = 0.0002, rounds up to 1
        assert_eq!(price.mul_gas_ceil(200_000).unwrap(), 1);
        assert_eq!(price.mul_gas_ceil(0).unwrap(), 0);

        let price: Dec = "2.5".parse().unwrap();
        assert_eq!(price.mul_gas_ceil(3).unwrap(), 8);
        assert_eq!(Dec::ONE.mul_gas_ceil(u64::MAX).unwrap(), u64::MAX as u128);
    }

    #[test]
    fn test_ordering() {
        let low: Dec = "0.1".parse().unwrap();
        let high: Dec = "0.25".parse().unwrap();
        assert!(low < high);
        assert!(Dec::ZERO.is_zero());
    }
}
