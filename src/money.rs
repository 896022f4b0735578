//! Conversions between decimal dollar strings and integer cents.

use thiserror::Error;

/// Cents per dollar.
pub const CENTS_PER_DOLLAR: u64 = 100;

/// Errors that can occur when parsing an amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AmountError {
    /// Not a decimal number with at most two fraction digits.
    #[error("invalid amount (use dollars, e.g. 10 or 12.50)")]
    Malformed,
    /// Amount is zero.
    #[error("amount must be positive")]
    NotPositive,
}

/// Parses a dollar amount such as `15`, `15.5` or `15.00` into cents.
///
/// # Errors
///
/// Returns [`AmountError::Malformed`] for signs, non-digits, more than two
/// fraction digits or overflow, and [`AmountError::NotPositive`] for zero.
///
/// # Example
///
/// ```
/// use bjcasino::money::parse_dollars;
///
/// assert_eq!(parse_dollars("13.33"), Ok(1333));
/// ```
pub fn parse_dollars(input: &str) -> Result<u64, AmountError> {
    let input = input.trim();
    let input = input.strip_prefix('$').unwrap_or(input);

    let (whole, fraction) = match input.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (input, None),
    };

    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AmountError::Malformed);
    }

    let cents = match fraction {
        None => 0,
        Some(f) if (1..=2).contains(&f.len()) && f.bytes().all(|b| b.is_ascii_digit()) => {
            let digits: u64 = f.parse().map_err(|_| AmountError::Malformed)?;
            if f.len() == 1 { digits * 10 } else { digits }
        }
        Some(_) => return Err(AmountError::Malformed),
    };

    let dollars: u64 = whole.parse().map_err(|_| AmountError::Malformed)?;
    let total = dollars
        .checked_mul(CENTS_PER_DOLLAR)
        .and_then(|d| d.checked_add(cents))
        .ok_or(AmountError::Malformed)?;

    if total == 0 {
        return Err(AmountError::NotPositive);
    }
    Ok(total)
}

/// Formats cents as dollars with two fraction digits, without a currency sign.
#[must_use]
pub fn format_dollars(cents: u64) -> String {
    format!(
        "{}.{:02}",
        cents / CENTS_PER_DOLLAR,
        cents % CENTS_PER_DOLLAR
    )
}
