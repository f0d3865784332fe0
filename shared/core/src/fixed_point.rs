//! Integer fixed-point arithmetic for ledger amounts.
//!
//! Every amount in the engine is an unsigned atomic quantity: token amounts carry
//! [`TOKEN_DECIMALS`], dollar values carry [`USDC_DECIMALS`], share prices and percentages
//! carry 18 decimals. Division always truncates toward zero. Products that may exceed
//! 128 bits go through a 256-bit intermediate in [`mul_div`].

use primitive_types::U256;
use thiserror::Error;

pub const TOKEN_DECIMALS: u32 = 18;
pub const USDC_DECIMALS: u32 = 6;
pub const SHARE_DECIMALS: u32 = 18;
pub const SHARE_PRICE_DECIMALS: u32 = 18;
pub const PERCENT_DECIMALS: u32 = 18;

/// `1e18`, the unit of [`Percent`]. A value of `PERCENT_UNIT` means 100%.
pub const PERCENT_UNIT: u128 = 1_000_000_000_000_000_000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArithmeticError {
    #[error("overflow computing {0}")]
    Overflow(&'static str),

    #[error("underflow computing {0}")]
    Underflow(&'static str),

    #[error("division by zero computing {0}")]
    DivisionByZero(&'static str),

    #[error("invalid decimal amount {0:?}")]
    InvalidDecimal(String),
}

pub type ArithmeticResult<T> = Result<T, ArithmeticError>;

pub fn pow10(decimals: u32) -> ArithmeticResult<u128> {
    10u128
        .checked_pow(decimals)
        .ok_or(ArithmeticError::Overflow("power of ten"))
}

pub fn add(a: u128, b: u128, what: &'static str) -> ArithmeticResult<u128> {
    a.checked_add(b).ok_or(ArithmeticError::Overflow(what))
}

pub fn sub(a: u128, b: u128, what: &'static str) -> ArithmeticResult<u128> {
    a.checked_sub(b).ok_or(ArithmeticError::Underflow(what))
}

/// `max(a - b, 0)`
pub fn sub_floor_zero(a: u128, b: u128) -> u128 {
    a.saturating_sub(b)
}

pub fn mul(a: u128, b: u128, what: &'static str) -> ArithmeticResult<u128> {
    a.checked_mul(b).ok_or(ArithmeticError::Overflow(what))
}

/// Truncating division.
pub fn div(a: u128, b: u128, what: &'static str) -> ArithmeticResult<u128> {
    a.checked_div(b).ok_or(ArithmeticError::DivisionByZero(what))
}

/// Computes `a * b / c` exactly, truncating the quotient.
pub fn mul_div(a: u128, b: u128, c: u128, what: &'static str) -> ArithmeticResult<u128> {
    if c == 0 {
        return Err(ArithmeticError::DivisionByZero(what));
    }
    // a * b always fits in 256 bits
    let quotient = (U256::from(a) * U256::from(b)) / U256::from(c);
    if quotient.bits() > 128 {
        return Err(ArithmeticError::Overflow(what));
    }
    Ok(quotient.low_u128())
}

/// Same as [`mul_div`], but yields zero when `c` is zero.
pub fn mul_div_or_zero(a: u128, b: u128, c: u128, what: &'static str) -> ArithmeticResult<u128> {
    if c == 0 {
        return Ok(0);
    }
    mul_div(a, b, c, what)
}

/// Exact test of `numerator / denominator > percent`, without truncating the ratio first.
/// A zero denominator never exceeds anything.
pub fn ratio_exceeds(numerator: u128, denominator: u128, percent: Percent) -> bool {
    if denominator == 0 {
        return false;
    }
    U256::from(numerator) * U256::from(PERCENT_UNIT)
        > U256::from(percent.0) * U256::from(denominator)
}

/// Checked sum over an iterator of amounts.
pub fn sum<I: IntoIterator<Item = u128>>(values: I, what: &'static str) -> ArithmeticResult<u128> {
    values.into_iter().try_fold(0u128, |acc, v| add(acc, v, what))
}

/// Re-expresses `amount` from `from_decimals` to `to_decimals`, truncating when precision
/// is dropped.
pub fn rescale(amount: u128, from_decimals: u32, to_decimals: u32) -> ArithmeticResult<u128> {
    if from_decimals >= to_decimals {
        div(amount, pow10(from_decimals - to_decimals)?, "rescale")
    } else {
        mul(amount, pow10(to_decimals - from_decimals)?, "rescale")
    }
}

/// Renders an atomic amount as a decimal string, e.g. `1_500_000` with 6 decimals is `"1.5"`.
pub fn format_units(amount: u128, decimals: u32) -> String {
    let Ok(unit) = pow10(decimals) else {
        return amount.to_string();
    };
    let whole = amount / unit;
    let fraction = amount % unit;
    if fraction == 0 {
        return whole.to_string();
    }
    let fraction = format!("{fraction:0width$}", width = decimals as usize);
    format!("{whole}.{}", fraction.trim_end_matches('0'))
}

/// Parses a human-readable decimal string into an atomic amount with `decimals` decimals.
/// Underscores are accepted as digit separators. Excess fractional digits are rejected
/// rather than silently truncated.
pub fn parse_units(value: &str, decimals: u32) -> ArithmeticResult<u128> {
    let invalid = || ArithmeticError::InvalidDecimal(value.to_string());
    let cleaned: String = value.trim().chars().filter(|c| *c != '_').collect();
    let (whole, fraction) = match cleaned.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (cleaned.as_str(), ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !all_digits(whole) || !all_digits(fraction) || fraction.len() > decimals as usize {
        return Err(invalid());
    }
    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };
    let padded = format!("{fraction:0<width$}", width = decimals as usize);
    let fraction: u128 = if padded.is_empty() {
        0
    } else {
        padded.parse().map_err(|_| invalid())?
    };
    add(mul(whole, pow10(decimals)?, "parse units")?, fraction, "parse units")
}

/// A fraction with [`PERCENT_DECIMALS`] decimals; `Percent(PERCENT_UNIT)` is 100%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Percent(pub u128);

impl Percent {
    pub const ZERO: Percent = Percent(0);

    /// `"4"` is 4%, `"0.5"` is half a percent.
    pub fn from_percent_str(value: &str) -> ArithmeticResult<Percent> {
        parse_units(value, PERCENT_DECIMALS - 2).map(Percent)
    }

    /// Fraction `numerator / denominator`, truncated.
    pub fn from_ratio(numerator: u128, denominator: u128) -> ArithmeticResult<Percent> {
        mul_div(numerator, PERCENT_UNIT, denominator, "percent ratio").map(Percent)
    }

    /// `amount * self`, truncated.
    pub fn apply(&self, amount: u128) -> ArithmeticResult<u128> {
        mul_div(amount, self.0, PERCENT_UNIT, "percent of amount")
    }

    pub fn checked_sub(&self, other: Percent) -> ArithmeticResult<Percent> {
        sub(self.0, other.0, "percent difference").map(Percent)
    }
}

impl std::fmt::Display for Percent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", format_units(self.0, PERCENT_DECIMALS - 2))
    }
}
