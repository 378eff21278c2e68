//! Money and percentage types
//!
//! Amounts are stored in cents (i64) and percentages in basis points so the
//! whole engine works on integers. Nothing here ever produces a fractional
//! cent.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// Represents a monetary amount stored as cents (hundredths of the currency unit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Create a Money amount from cents
    ///
    /// # Examples
    /// ```
    /// use envelope_waterfall::models::Money;
    /// let amount = Money::from_cents(1050); // $10.50
    /// assert_eq!(amount.to_string(), "$10.50");
    /// ```
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Create a Money amount from dollars and cents
    pub const fn from_dollars_cents(dollars: i64, cents: i64) -> Self {
        Self(dollars * 100 + cents)
    }

    /// Create a zero Money amount
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Get the amount in cents
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Get the whole dollars portion (truncated toward zero)
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Get the cents portion (0-99)
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Clamp negative amounts to zero
    pub fn non_negative(self) -> Self {
        Self(self.0.max(0))
    }

    /// Split into `parts` equal shares using floor division.
    ///
    /// Returns the per-part share and the undistributed leftover.
    pub fn split_even(self, parts: usize) -> (Money, Money) {
        if parts == 0 {
            return (Money::zero(), self);
        }
        let parts = parts as i64;
        let share = self.0.div_euclid(parts);
        (Self(share), Self(self.0 - share * parts))
    }

    /// Parse a money amount from a string
    ///
    /// Accepts formats: "10.50", "-10.50", "$10.50", "10"
    pub fn parse(s: &str) -> Result<Self, MoneyParseError> {
        let s = s.trim();

        let (negative, s) = if let Some(stripped) = s.strip_prefix('-') {
            (true, stripped)
        } else {
            (false, s)
        };

        let s = s.strip_prefix('$').unwrap_or(s);
        let invalid = || MoneyParseError::InvalidFormat(s.to_string());

        let cents = match s.split_once('.') {
            Some((whole, frac)) => {
                if frac.contains('.') {
                    return Err(invalid());
                }
                let dollars: i64 = whole.parse().map_err(|_| invalid())?;
                let cents: i64 = match frac.len() {
                    0 => 0,
                    1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
                    _ => frac[..2].parse().map_err(|_| invalid())?,
                };
                dollars * 100 + cents
            }
            None => s.parse::<i64>().map_err(|_| invalid())? * 100,
        };

        Ok(Self(if negative { -cents } else { cents }))
    }

    /// Format with a currency symbol
    pub fn format_with_symbol(&self, symbol: &str) -> String {
        if self.is_negative() {
            format!("-{}{}.{:02}", symbol, self.dollars().abs(), self.cents_part())
        } else {
            format!("{}{}.{:02}", symbol, self.dollars(), self.cents_part())
        }
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_with_symbol("$"))
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self(self.0 - other.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

/// Error type for money parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoneyParseError {
    InvalidFormat(String),
}

impl fmt::Display for MoneyParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoneyParseError::InvalidFormat(s) => write!(f, "Invalid money format: {}", s),
        }
    }
}

impl std::error::Error for MoneyParseError {}

/// A percentage in basis points (1% = 100)
///
/// Valid rule percentages are in (0, 100], i.e. 1..=10000 basis points.
/// Serialized as a percent value: `30`, `12.5`, or a string such as `"30%"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "PercentValue", into = "PercentValue")]
pub struct Percentage(u32);

/// Wire form of a percentage
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum PercentValue {
    Whole(u32),
    Fraction(f64),
    Text(String),
}

impl TryFrom<PercentValue> for Percentage {
    type Error = PercentageParseError;

    fn try_from(value: PercentValue) -> Result<Self, Self::Error> {
        match value {
            PercentValue::Whole(percent) => percent
                .checked_mul(100)
                .map(Self)
                .ok_or_else(|| PercentageParseError(percent.to_string())),
            PercentValue::Fraction(percent) => Self::parse(&percent.to_string()),
            PercentValue::Text(text) => Self::parse(&text),
        }
    }
}

impl From<Percentage> for PercentValue {
    fn from(percent: Percentage) -> Self {
        if percent.0 % 100 == 0 {
            Self::Whole(percent.0 / 100)
        } else {
            Self::Fraction(percent.0 as f64 / 100.0)
        }
    }
}

impl Percentage {
    pub const MAX_BASIS_POINTS: u32 = 10_000;

    pub const fn from_basis_points(bp: u32) -> Self {
        Self(bp)
    }

    pub const fn from_percent(percent: u32) -> Self {
        Self(percent * 100)
    }

    pub const fn basis_points(&self) -> u32 {
        self.0
    }

    /// True when the percentage lies in (0, 100]
    pub const fn is_valid(&self) -> bool {
        self.0 > 0 && self.0 <= Self::MAX_BASIS_POINTS
    }

    /// `floor(total * self / 100%)`
    pub fn of(&self, total: Money) -> Money {
        let scaled = total.cents() as i128 * self.0 as i128;
        Money::from_cents(scaled.div_euclid(Self::MAX_BASIS_POINTS as i128) as i64)
    }

    /// Parse "30", "30%", or "12.5"
    pub fn parse(s: &str) -> Result<Self, PercentageParseError> {
        let s = s.trim();
        let s = s.strip_suffix('%').unwrap_or(s).trim();
        let invalid = || PercentageParseError(s.to_string());

        let bp = match s.split_once('.') {
            Some((whole, frac)) => {
                let whole: u32 = whole.parse().map_err(|_| invalid())?;
                let frac_bp: u32 = match frac.len() {
                    0 => 0,
                    1 => frac.parse::<u32>().map_err(|_| invalid())? * 10,
                    2 => frac.parse().map_err(|_| invalid())?,
                    _ => return Err(invalid()),
                };
                whole.checked_mul(100).ok_or_else(invalid)? + frac_bp
            }
            None => s
                .parse::<u32>()
                .map_err(|_| invalid())?
                .checked_mul(100)
                .ok_or_else(invalid)?,
        };

        Ok(Self(bp))
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 100;
        let frac = self.0 % 100;
        if frac == 0 {
            write!(f, "{}%", whole)
        } else if frac % 10 == 0 {
            write!(f, "{}.{}%", whole, frac / 10)
        } else {
            write!(f, "{}.{:02}%", whole, frac)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PercentageParseError(String);

impl fmt::Display for PercentageParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid percentage: {}", self.0)
    }
}

impl std::error::Error for PercentageParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1050).to_string(), "$10.50");
        assert_eq!(Money::from_cents(0).to_string(), "$0.00");
        assert_eq!(Money::from_cents(-1050).to_string(), "-$10.50");
        assert_eq!(Money::from_cents(5).to_string(), "$0.05");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((-a).cents(), -1000);
        assert_eq!((b - a).non_negative(), Money::zero());
    }

    #[test]
    fn test_parse() {
        assert_eq!(Money::parse("10.50").unwrap().cents(), 1050);
        assert_eq!(Money::parse("$10.50").unwrap().cents(), 1050);
        assert_eq!(Money::parse("-10.50").unwrap().cents(), -1050);
        assert_eq!(Money::parse("10").unwrap().cents(), 1000);
        assert_eq!(Money::parse("10.5").unwrap().cents(), 1050);
        assert!(Money::parse("1.2.3").is_err());
        assert!(Money::parse("abc").is_err());
    }

    #[test]
    fn test_split_even_keeps_leftover() {
        let (share, leftover) = Money::from_cents(100).split_even(3);
        assert_eq!(share.cents(), 33);
        assert_eq!(leftover.cents(), 1);

        let (share, leftover) = Money::from_cents(100).split_even(0);
        assert_eq!(share, Money::zero());
        assert_eq!(leftover.cents(), 100);
    }

    #[test]
    fn test_percentage_of_floors() {
        let p = Percentage::from_percent(30);
        assert_eq!(p.of(Money::from_cents(1000)).cents(), 300);

        let third = Percentage::from_basis_points(3333);
        assert_eq!(third.of(Money::from_cents(100)).cents(), 33);

        let half = Percentage::from_basis_points(5000);
        assert_eq!(half.of(Money::from_cents(3)).cents(), 1);
    }

    #[test]
    fn test_percentage_validity() {
        assert!(Percentage::from_percent(100).is_valid());
        assert!(Percentage::from_basis_points(1).is_valid());
        assert!(!Percentage::from_percent(0).is_valid());
        assert!(!Percentage::from_basis_points(10_001).is_valid());
    }

    #[test]
    fn test_percentage_parse_and_display() {
        assert_eq!(Percentage::parse("30").unwrap(), Percentage::from_percent(30));
        assert_eq!(Percentage::parse("30%").unwrap(), Percentage::from_percent(30));
        assert_eq!(Percentage::parse("12.5").unwrap().basis_points(), 1250);
        assert_eq!(Percentage::parse("0.25").unwrap().basis_points(), 25);
        assert!(Percentage::parse("1.234").is_err());
        assert!(Percentage::parse("ten").is_err());

        assert_eq!(Percentage::from_percent(30).to_string(), "30%");
        assert_eq!(Percentage::from_basis_points(1250).to_string(), "12.5%");
        assert_eq!(Percentage::from_basis_points(25).to_string(), "0.25%");
    }

    #[test]
    fn test_serialization() {
        let m = Money::from_cents(1050);
        assert_eq!(serde_json::to_string(&m).unwrap(), "1050");
        let p = Percentage::from_percent(30);
        assert_eq!(serde_json::to_string(&p).unwrap(), "30");
        let p = Percentage::from_basis_points(1250);
        assert_eq!(serde_json::to_string(&p).unwrap(), "12.5");
    }

    #[test]
    fn test_percentage_reads_percent_values() {
        let read = |json: &str| serde_json::from_str::<Percentage>(json);
        assert_eq!(read("30").unwrap().basis_points(), 3000);
        assert_eq!(read("12.5").unwrap().basis_points(), 1250);
        assert_eq!(read("\"33.33%\"").unwrap().basis_points(), 3333);
        assert!(read("-5").is_err());
        assert!(read("1.234").is_err());
    }
}
