//! Card expiry date.

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use super::CardError;

/// Month and four-digit year printed on a card. The card stays valid through
/// the last day of that month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Expiry {
    // Field order matters for the derived ordering.
    pub year: i32,
    pub month: u32,
}

impl Expiry {
    /// Build an expiry from optional form fields.
    ///
    /// # Errors
    ///
    /// [`CardError::MissingExpiry`] if either part is absent and
    /// [`CardError::InvalidExpiryMonth`] if the month is not 1-12.
    pub fn new(month: Option<u32>, year: Option<i32>) -> Result<Self, CardError> {
        let (Some(month), Some(year)) = (month, year) else {
            return Err(CardError::MissingExpiry);
        };
        if !(1..=12).contains(&month) {
            return Err(CardError::InvalidExpiryMonth(month));
        }
        Ok(Self { year, month })
    }

    /// Fail if the card expired before the month containing `today`.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::Expired`].
    pub fn ensure_valid_on(&self, today: NaiveDate) -> Result<(), CardError> {
        let current = Self {
            year: today.year(),
            month: today.month(),
        };
        if *self < current {
            return Err(CardError::Expired {
                month: self.month,
                year: self.year,
            });
        }
        Ok(())
    }

    /// [`Expiry::ensure_valid_on`] against the local calendar date.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::Expired`].
    pub fn ensure_not_expired(&self) -> Result<(), CardError> {
        self.ensure_valid_on(Local::now().date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn both_parts_required() {
        assert_eq!(Expiry::new(None, Some(2030)), Err(CardError::MissingExpiry));
        assert_eq!(Expiry::new(Some(5), None), Err(CardError::MissingExpiry));
        assert_eq!(Expiry::new(None, None), Err(CardError::MissingExpiry));
    }

    #[test]
    fn month_out_of_range() {
        assert_eq!(Expiry::new(Some(0), Some(2030)), Err(CardError::InvalidExpiryMonth(0)));
        assert_eq!(Expiry::new(Some(13), Some(2030)), Err(CardError::InvalidExpiryMonth(13)));
        assert!(Expiry::new(Some(12), Some(2030)).is_ok());
    }

    #[test]
    fn current_month_is_still_valid() {
        let exp = Expiry::new(Some(10), Some(2026)).unwrap();
        assert!(exp.ensure_valid_on(day(2026, 10, 31)).is_ok());
        assert!(exp.ensure_valid_on(day(2026, 1, 1)).is_ok());
    }

    #[test]
    fn past_month_or_year_is_expired() {
        let exp = Expiry::new(Some(9), Some(2026)).unwrap();
        assert_eq!(
            exp.ensure_valid_on(day(2026, 10, 1)),
            Err(CardError::Expired { month: 9, year: 2026 })
        );
        let exp = Expiry::new(Some(12), Some(2025)).unwrap();
        assert!(exp.ensure_valid_on(day(2026, 1, 15)).is_err());
    }

    #[test]
    fn later_year_with_earlier_month_is_valid() {
        let exp = Expiry::new(Some(1), Some(2027)).unwrap();
        assert!(exp.ensure_valid_on(day(2026, 12, 1)).is_ok());
    }

    #[test]
    fn far_future_card_is_valid_today() {
        assert!(Expiry::new(Some(1), Some(2099)).unwrap().ensure_not_expired().is_ok());
    }
}
