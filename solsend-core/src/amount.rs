//! SOL decimal parsing into lamports with strict integer arithmetic.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lamport conversion constant: 1 SOL = 1,000,000,000 lamports.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;
/// Number of fractional SOL digits representable in lamports.
pub const SOL_DECIMALS: usize = 9;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,
    #[error("amount contains a sign; negative/positive signs are not allowed")]
    SignNotAllowed,
    #[error("amount contains invalid characters")]
    InvalidCharacters,
    #[error("amount has more than one decimal point")]
    MultipleDecimalPoints,
    #[error("amount has invalid digits")]
    InvalidDigits,
    #[error("amount is more precise than 1 lamport (0.000000001 SOL)")]
    BelowResolution,
    #[error("amount must be greater than 0")]
    NotPositive,
    #[error("amount arithmetic overflow")]
    Overflow,
}

/// Minor-unit quantity of SOL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lamports(u64);

impl Lamports {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Reject zero before an amount is allowed anywhere near a transaction.
    pub fn require_positive(self) -> Result<Self, AmountError> {
        if self.is_zero() {
            Err(AmountError::NotPositive)
        } else {
            Ok(self)
        }
    }

    pub fn to_sol_string(&self) -> String {
        let whole = self.0 / LAMPORTS_PER_SOL;
        let frac = self.0 % LAMPORTS_PER_SOL;
        if frac == 0 {
            return whole.to_string();
        }

        let mut frac_str = format!("{frac:09}");
        while frac_str.ends_with('0') {
            frac_str.pop();
        }
        format!("{whole}.{frac_str}")
    }
}

impl From<Lamports> for u64 {
    fn from(value: Lamports) -> Self {
        value.0
    }
}

impl Display for Lamports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_sol_string())
    }
}

fn all_digits(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_digit())
}

fn parse_u64_digits(s: &str) -> Result<u64, AmountError> {
    if s.is_empty() {
        return Ok(0);
    }
    if !all_digits(s) {
        return Err(AmountError::InvalidDigits);
    }
    s.parse::<u64>().map_err(|_| AmountError::Overflow)
}

/// Parse a decimal SOL string into lamports with no floating-point math.
///
/// Zero is accepted here; callers that need a submittable amount use
/// [`parse_positive_sol`]. Digits past the ninth decimal place are only
/// tolerated when they are all zero.
pub fn parse_sol_to_lamports(input: &str) -> Result<Lamports, AmountError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(AmountError::Empty);
    }

    if s.starts_with('-') || s.starts_with('+') {
        return Err(AmountError::SignNotAllowed);
    }

    for c in s.chars() {
        if !(c.is_ascii_digit() || c == '.') {
            return Err(AmountError::InvalidCharacters);
        }
    }

    if s.chars().filter(|c| *c == '.').count() > 1 {
        return Err(AmountError::MultipleDecimalPoints);
    }

    let mut iter = s.splitn(2, '.');
    let whole_str = iter.next().ok_or(AmountError::InvalidDigits)?;
    let frac_opt = iter.next();

    if whole_str.is_empty() && frac_opt.map_or(true, str::is_empty) {
        return Err(AmountError::InvalidDigits);
    }

    let whole = parse_u64_digits(whole_str)?;
    let whole_lamports = whole
        .checked_mul(LAMPORTS_PER_SOL)
        .ok_or(AmountError::Overflow)?;

    let frac_lamports = match frac_opt {
        None => 0_u64,
        Some(frac_str) => {
            let (significant, excess) = if frac_str.len() > SOL_DECIMALS {
                frac_str.split_at(SOL_DECIMALS)
            } else {
                (frac_str, "")
            };
            if excess.chars().any(|c| c != '0') {
                return Err(AmountError::BelowResolution);
            }

            let mut padded = significant.to_string();
            while padded.len() < SOL_DECIMALS {
                padded.push('0');
            }
            parse_u64_digits(&padded)?
        }
    };

    whole_lamports
        .checked_add(frac_lamports)
        .map(Lamports)
        .ok_or(AmountError::Overflow)
}

/// Parse a SOL amount that is allowed to be submitted (at least 1 lamport).
pub fn parse_positive_sol(input: &str) -> Result<Lamports, AmountError> {
    parse_sol_to_lamports(input)?.require_positive()
}

/// Format a lamport amount as a SOL string with at least 2 decimals.
pub fn format_lamports_as_sol(amount: Lamports) -> String {
    let whole = amount.as_u64() / LAMPORTS_PER_SOL;
    let frac = amount.as_u64() % LAMPORTS_PER_SOL;

    let mut frac_str = format!("{frac:09}");
    while frac_str.ends_with('0') && frac_str.len() > 2 {
        frac_str.pop();
    }

    format!("{whole}.{frac_str} SOL")
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn parses_integer_amount() {
        assert_eq!(parse_sol_to_lamports("2").unwrap().as_u64(), 2_000_000_000);
    }

    #[test]
    fn parses_one_and_a_half() {
        assert_eq!(
            parse_sol_to_lamports("1.5").unwrap().as_u64(),
            1_500_000_000
        );
    }

    #[test]
    fn parses_min_unit() {
        assert_eq!(parse_sol_to_lamports("0.000000001").unwrap().as_u64(), 1);
    }

    #[test]
    fn parses_leading_and_trailing_dot() {
        assert_eq!(parse_sol_to_lamports(".5").unwrap().as_u64(), 500_000_000);
        assert_eq!(parse_sol_to_lamports("1.").unwrap().as_u64(), 1_000_000_000);
    }

    #[test]
    fn tolerates_trailing_zeros_past_resolution() {
        assert_eq!(parse_sol_to_lamports("0.0000000010").unwrap().as_u64(), 1);
    }

    #[test]
    fn rejects_amount_below_resolution() {
        assert_eq!(
            parse_sol_to_lamports("0.0000000001"),
            Err(AmountError::BelowResolution)
        );
        assert_eq!(
            parse_sol_to_lamports("1.0000000015"),
            Err(AmountError::BelowResolution)
        );
    }

    #[test]
    fn zero_parses_but_is_not_submittable() {
        assert!(parse_sol_to_lamports("0").unwrap().is_zero());
        assert_eq!(parse_positive_sol("0.000"), Err(AmountError::NotPositive));
    }

    #[test]
    fn rejects_signs_and_non_numeric_input() {
        assert_eq!(parse_sol_to_lamports("-1"), Err(AmountError::SignNotAllowed));
        assert_eq!(parse_sol_to_lamports("+1"), Err(AmountError::SignNotAllowed));
        assert_eq!(parse_sol_to_lamports("NaN"), Err(AmountError::InvalidCharacters));
        assert_eq!(parse_sol_to_lamports("inf"), Err(AmountError::InvalidCharacters));
        assert_eq!(parse_sol_to_lamports("1e9"), Err(AmountError::InvalidCharacters));
        assert_eq!(parse_sol_to_lamports("1,5"), Err(AmountError::InvalidCharacters));
        assert_eq!(parse_sol_to_lamports("."), Err(AmountError::InvalidDigits));
        assert_eq!(parse_sol_to_lamports("   "), Err(AmountError::Empty));
        assert_eq!(
            parse_sol_to_lamports("1.2.3"),
            Err(AmountError::MultipleDecimalPoints)
        );
    }

    #[test]
    fn rejects_overflowing_amount() {
        assert_eq!(
            parse_sol_to_lamports("18446744074"),
            Err(AmountError::Overflow)
        );
    }

    #[test]
    fn formats_sol_strings() {
        assert_eq!(Lamports::new(1_500_000_000).to_sol_string(), "1.5");
        assert_eq!(Lamports::new(1).to_sol_string(), "0.000000001");
        assert_eq!(Lamports::new(2_000_000_000).to_sol_string(), "2");
        assert_eq!(format_lamports_as_sol(Lamports::new(2_000_000_000)), "2.00 SOL");
        assert_eq!(
            format_lamports_as_sol(Lamports::new(1_234_500_000)),
            "1.2345 SOL"
        );
    }

    proptest! {
        #[test]
        fn sol_string_roundtrips_through_lamports(value in 0_u64..=u64::MAX) {
            let lamports = Lamports::new(value);
            let reparsed = parse_sol_to_lamports(&lamports.to_sol_string())
                .expect("formatted amount should parse");
            prop_assert_eq!(reparsed, lamports);
        }
    }
}
