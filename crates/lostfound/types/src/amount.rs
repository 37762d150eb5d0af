//! Reward amounts, denominated in wei

use crate::ValidationError;
use serde::{Deserialize, Serialize};

/// Number of wei in one ether.
pub const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

/// Fractional digits an ether amount can carry.
const ETHER_DECIMALS: usize = 18;

/// A non-negative reward amount in wei.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Amount(pub u128);

impl Amount {
    pub fn new(wei: u128) -> Self {
        Self(wei)
    }

    pub fn zero() -> Self {
        Self(0)
    }

    pub fn wei(self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Parse a decimal ether amount such as `"0.01"` or `"2"`.
    ///
    /// Empty input is zero. Signs, exponents, and more than 18 fractional
    /// digits are rejected.
    pub fn parse_ether(raw: &str) -> Result<Self, ValidationError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(Self::zero());
        }
        if raw.starts_with('-') {
            return Err(ValidationError::single("reward", "reward must not be negative"));
        }

        let (whole, fraction) = match raw.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (raw, ""),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(ValidationError::single("reward", "reward must be a number"));
        }
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(whole) || !all_digits(fraction) {
            return Err(ValidationError::single("reward", "reward must be a number"));
        }
        if fraction.len() > ETHER_DECIMALS {
            return Err(ValidationError::single(
                "reward",
                "reward supports at most 18 decimal places",
            ));
        }

        let overflow = || ValidationError::single("reward", "reward is too large");
        let whole_wei = if whole.is_empty() {
            0
        } else {
            whole
                .parse::<u128>()
                .map_err(|_| overflow())?
                .checked_mul(WEI_PER_ETHER)
                .ok_or_else(overflow)?
        };
        let fraction_wei = if fraction.is_empty() {
            0
        } else {
            let padded = format!("{:0<width$}", fraction, width = ETHER_DECIMALS);
            padded.parse::<u128>().map_err(|_| overflow())?
        };

        whole_wei
            .checked_add(fraction_wei)
            .map(Self)
            .ok_or_else(overflow)
    }

    /// Render as a trimmed ether decimal, e.g. `0.01`.
    pub fn to_ether_string(self) -> String {
        let whole = self.0 / WEI_PER_ETHER;
        let fraction = self.0 % WEI_PER_ETHER;
        if fraction == 0 {
            return whole.to_string();
        }
        let digits = format!("{:0>width$}", fraction, width = ETHER_DECIMALS);
        format!("{}.{}", whole, digits.trim_end_matches('0'))
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ETH", self.to_ether_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ether() {
        assert_eq!(Amount::parse_ether("0.01").unwrap().wei(), 10_000_000_000_000_000);
        assert_eq!(Amount::parse_ether("2").unwrap().wei(), 2 * WEI_PER_ETHER);
        assert_eq!(Amount::parse_ether(".5").unwrap().wei(), WEI_PER_ETHER / 2);
        assert_eq!(Amount::parse_ether("1.").unwrap().wei(), WEI_PER_ETHER);
        assert_eq!(Amount::parse_ether("0.000000000000000001").unwrap().wei(), 1);
        assert!(Amount::parse_ether("").unwrap().is_zero());
        assert!(Amount::parse_ether("0").unwrap().is_zero());
    }

    #[test]
    fn test_parse_ether_rejects_bad_input() {
        let negative = Amount::parse_ether("-0.5").unwrap_err();
        assert_eq!(negative.violations()[0].field, "reward");
        assert!(negative.to_string().contains("negative"));

        assert!(Amount::parse_ether("abc").is_err());
        assert!(Amount::parse_ether("1e3").is_err());
        assert!(Amount::parse_ether(".").is_err());
        assert!(Amount::parse_ether("+1").is_err());
        assert!(Amount::parse_ether("0.0000000000000000001").is_err());
        assert!(Amount::parse_ether("999999999999999999999999999999999").is_err());
    }

    #[test]
    fn test_ether_display() {
        assert_eq!(Amount::new(10_000_000_000_000_000).to_ether_string(), "0.01");
        assert_eq!(Amount::new(3 * WEI_PER_ETHER).to_ether_string(), "3");
        assert_eq!(Amount::new(1).to_ether_string(), "0.000000000000000001");
        assert_eq!(Amount::zero().to_string(), "0 ETH");
    }
}
