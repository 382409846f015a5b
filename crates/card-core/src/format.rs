//! Display forms of card numbers: grouped, last four, masked.
//!
//! Best-effort string transforms; they never fail and never validate.

use crate::card::strip_separators;

/// Glyph that replaces hidden digits in a masked number.
pub const MASK_GLYPH: char = '•';

const GROUP_SIZE: usize = 4;

/// Remove whitespace and regroup what remains into blocks of four separated by
/// a single space: `"4111111111111111"` → `"4111 1111 1111 1111"`.
///
/// Only whitespace is removed; any other character is grouped like a digit.
pub fn format_card_number(raw: &str) -> String {
    let compact: Vec<char> = raw.chars().filter(|c| !c.is_whitespace()).collect();
    compact
        .chunks(GROUP_SIZE)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// The final four characters after stripping separators (fewer if shorter).
pub fn get_last_four_digits(raw: &str) -> String {
    let number: Vec<char> = strip_separators(raw).chars().collect();
    let start = number.len().saturating_sub(GROUP_SIZE);
    number[start..].iter().collect()
}

/// Replace all but the last four characters with [`MASK_GLYPH`] and group the
/// result: `"4111111111111111"` → `"•••• •••• •••• 1111"`.
///
/// Inputs of four characters or fewer are returned grouped but unmasked.
pub fn mask_card_number(raw: &str) -> String {
    let number = strip_separators(raw);
    let len = number.chars().count();
    let hidden = len.saturating_sub(GROUP_SIZE);
    let masked: String = number
        .chars()
        .enumerate()
        .map(|(i, c)| if i < hidden { MASK_GLYPH } else { c })
        .collect();
    format_card_number(&masked)
}
