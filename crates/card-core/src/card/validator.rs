//! Structural and Luhn checksum validation of card numbers.

use thiserror::Error;

use super::strip_separators;

/// Shortest accepted card number, in digits.
pub const MIN_DIGITS: usize = 13;

/// Longest accepted card number, in digits.
pub const MAX_DIGITS: usize = 19;

/// Accepted security code lengths, in digits.
pub const CVV_DIGITS: std::ops::RangeInclusive<usize> = 3..=4;

/// Reasons the details of a new card are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CardError {
    /// Something other than digits remained after stripping separators.
    #[error("card number contains non-digit characters")]
    InvalidCharacters,

    /// Digit count outside the accepted range.
    #[error("card number must have {MIN_DIGITS}-{MAX_DIGITS} digits, got {0}")]
    InvalidLength(usize),

    /// Well-formed, but the Luhn checksum does not hold.
    #[error("card number fails the Luhn checksum")]
    ChecksumMismatch,

    /// The security code is not 3 or 4 digits.
    #[error("CVV must have 3 or 4 digits")]
    InvalidCvv,

    /// Expiry month or year was not given.
    #[error("expiry month and year are required")]
    MissingExpiry,

    #[error("expiry month must be between 1 and 12, got {0}")]
    InvalidExpiryMonth(u32),

    /// The expiry month lies before the current month.
    #[error("card expired in {month:02}/{year}")]
    Expired { month: u32, year: i32 },
}

impl CardError {
    /// `true` for the structural failures detected before the checksum runs.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidCharacters | Self::InvalidLength(_))
    }
}

/// A digit string that passed the length and Luhn checks.
///
/// Has no `Display`; `Debug` shows only the last four digits.
#[derive(Clone, PartialEq, Eq)]
pub struct CardNumber(String);

impl CardNumber {
    /// Strip whitespace and hyphens from `raw` and validate what remains.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::InvalidCharacters`] or [`CardError::InvalidLength`]
    /// for structurally bad input, and [`CardError::ChecksumMismatch`] if the
    /// Luhn check fails.
    pub fn parse(raw: &str) -> Result<Self, CardError> {
        let digits = strip_separators(raw);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CardError::InvalidCharacters);
        }
        if !(MIN_DIGITS..=MAX_DIGITS).contains(&digits.len()) {
            return Err(CardError::InvalidLength(digits.len()));
        }
        if !luhn_valid(&digits) {
            return Err(CardError::ChecksumMismatch);
        }
        Ok(Self(digits))
    }

    /// The bare digits.
    pub fn digits(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for CardNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CardNumber(…{})", crate::format::get_last_four_digits(&self.0))
    }
}

/// `true` if `raw` is a 13–19 digit card number (separators allowed) with a
/// valid Luhn checksum.
pub fn validate_card_number(raw: &str) -> bool {
    CardNumber::parse(raw).is_ok()
}

/// Check a security code: 3 or 4 ASCII digits, nothing else.
///
/// # Errors
///
/// Returns [`CardError::InvalidCvv`] otherwise.
pub fn validate_cvv(cvv: &str) -> Result<(), CardError> {
    if CVV_DIGITS.contains(&cvv.len()) && cvv.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(CardError::InvalidCvv)
    }
}

/// Luhn checksum over an all-ASCII-digit string. Any other byte fails the check.
///
/// Walks from the rightmost digit, doubling every second one starting with the
/// second-from-last and folding doubled values above 9.
pub(crate) fn luhn_valid(digits: &str) -> bool {
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let sum: u32 = digits
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let d = u32::from(b - b'0');
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}
