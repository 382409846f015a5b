//! Card detail validation and issuer-brand detection.
//!
//! Pure functions: no I/O, no logging of the numbers they inspect.

pub mod brand;
pub mod expiry;
pub mod validator;

pub use brand::{detect_card_brand, CardBrand};
pub use expiry::Expiry;
pub use validator::{validate_card_number, validate_cvv, CardError, CardNumber};

/// Remove whitespace and hyphens, the separators users type between groups.
pub(crate) fn strip_separators(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_separators_keeps_other_characters() {
        assert_eq!(strip_separators(" 41-11\t1111 x"), "41111111x");
    }
}
