//! Lossless percentage type backed by rust_decimal.
//!
//! Fee percentages are configured by an operator and may be fractional
//! (e.g. `2.5`). They are kept as exact decimals so fee rounding never
//! depends on binary floating point.

use rust_decimal::Decimal as RustDecimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A percentage such as `5` (meaning 5%).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Percentage(RustDecimal);

impl Percentage {
    /// Create a whole-number percentage.
    pub fn from_whole(value: u32) -> Self {
        Percentage(RustDecimal::from(value))
    }

    /// Parse a Percentage from a string losslessly.
    ///
    /// # Errors
    /// Returns an error if the string is not a valid decimal number.
    pub fn from_str_canonical(s: &str) -> Result<Self, rust_decimal::Error> {
        RustDecimal::from_str(s).map(Percentage)
    }

    /// Format as a canonical string (no exponent notation, no trailing zeros).
    pub fn to_canonical_string(&self) -> String {
        format!("{}", self.0.normalize())
    }

    /// The percentage as a fraction: `5` becomes `0.05`.
    pub fn as_fraction(&self) -> RustDecimal {
        self.0 / RustDecimal::ONE_HUNDRED
    }

    /// Returns true if the value is < 0.
    pub fn is_negative(&self) -> bool {
        !self.0.is_zero() && self.0.is_sign_negative()
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.to_canonical_string())
    }
}

impl FromStr for Percentage {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_canonical(s)
    }
}
