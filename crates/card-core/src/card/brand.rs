//! Issuer-brand detection from leading digits.

use serde::{Deserialize, Serialize};

use super::strip_separators;

/// Card issuer brand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardBrand {
    Visa,
    Mastercard,
    Amex,
    Elo,
    Hipercard,
    Other,
}

impl CardBrand {
    /// Lowercase name, as stored alongside a card record.
    pub fn as_str(&self) -> &'static str {
        match self {
            CardBrand::Visa => "visa",
            CardBrand::Mastercard => "mastercard",
            CardBrand::Amex => "amex",
            CardBrand::Elo => "elo",
            CardBrand::Hipercard => "hipercard",
            CardBrand::Other => "other",
        }
    }
}

impl std::fmt::Display for CardBrand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Prefix rules, evaluated top to bottom; the first match wins.
///
/// Order matters: several Elo prefixes start with `4` and are therefore
/// reported as Visa.
pub const BRAND_TABLE: &[(&[&str], CardBrand)] = &[
    (&["4"], CardBrand::Visa),
    (&["51", "52", "53", "54", "55"], CardBrand::Mastercard),
    (&["22", "23", "24", "25", "26", "27"], CardBrand::Mastercard),
    (&["34", "37"], CardBrand::Amex),
    (
        &["636368", "438935", "504175", "451416", "636297", "5067", "4576", "4011"],
        CardBrand::Elo,
    ),
    (&["606282"], CardBrand::Hipercard),
];

/// Classify `raw` (separators allowed) by its leading digits.
pub fn detect_card_brand(raw: &str) -> CardBrand {
    let number = strip_separators(raw);
    BRAND_TABLE
        .iter()
        .find(|(prefixes, _)| prefixes.iter().any(|p| number.starts_with(p)))
        .map(|(_, brand)| *brand)
        .unwrap_or(CardBrand::Other)
}
