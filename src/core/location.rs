//! Best-effort location extraction from receipt text.
//!
//! Receipts have no fixed layout, so this is a set of independent pattern
//! matches rather than a parser. Every field of the result may be absent.

use crate::models::ReceiptLocation;
use regex::Regex;
use std::sync::OnceLock;

macro_rules! re {
    ($name:ident, $pat:expr) => {
        #[allow(clippy::expect_used)]
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_zip, r"\b(\d{5})\b");
re!(re_state_before_zip, r"\b([A-Z]{2})\b\s*\d{5}");
// City words are joined by spaces only so a street line above cannot run into the city.
re!(re_city_state, r"([A-Z][a-z]+(?:[ \t][A-Z][a-z]+)*),\s*([A-Z]{2})");
re!(
    re_street_address,
    r"(?i)(\d+[ \t]+[A-Za-z0-9 \t,]+(?:Street|St|Avenue|Ave|Road|Rd|Boulevard|Blvd|Lane|Ln|Drive|Dr))"
);

/// Pulls ZIP, state, city, and street address out of free-form receipt text.
///
/// All patterns are tried. A `City, ST` match overrides the state found in
/// front of the ZIP code. `county` and `store_name` are never filled in here.
#[must_use]
pub fn extract_location(text: &str) -> ReceiptLocation {
    let mut location = ReceiptLocation::default();

    if let Some(caps) = re_zip().captures(text) {
        location.zip_code = Some(caps[1].to_string());
    }

    if let Some(caps) = re_state_before_zip().captures(text) {
        location.state = Some(caps[1].to_string());
    }

    if let Some(caps) = re_city_state().captures(text) {
        location.city = Some(caps[1].to_string());
        location.state = Some(caps[2].to_string());
    }

    if let Some(caps) = re_street_address().captures(text) {
        location.store_address = Some(caps[1].to_string());
    }

    location
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_full_receipt_header() {
        let location = extract_location("Target\n123 Main St\nSan Francisco, CA 94102");

        assert_eq!(location.zip_code.as_deref(), Some("94102"));
        assert_eq!(location.city.as_deref(), Some("San Francisco"));
        assert_eq!(location.state.as_deref(), Some("CA"));
        assert_eq!(location.store_address.as_deref(), Some("123 Main St"));
        assert!(location.county.is_none());
        assert!(location.store_name.is_none());
    }

    #[test]
    fn test_extract_nothing_from_plain_text() {
        assert_eq!(extract_location("thanks for shopping"), ReceiptLocation::default());
    }

    #[test]
    fn test_state_from_zip_line_without_city() {
        let location = extract_location("STORE #42\nTX 75001");
        assert_eq!(location.state.as_deref(), Some("TX"));
        assert_eq!(location.zip_code.as_deref(), Some("75001"));
        assert!(location.city.is_none());
    }

    #[test]
    fn test_city_match_overrides_state() {
        let location = extract_location("NY 10001 branch\nPortland, OR");
        assert_eq!(location.city.as_deref(), Some("Portland"));
        assert_eq!(location.state.as_deref(), Some("OR"));
    }

    #[test]
    fn test_zip_ignores_longer_digit_runs() {
        let location = extract_location("Card 123456789\nRef 60614");
        assert_eq!(location.zip_code.as_deref(), Some("60614"));
    }

    #[test]
    fn test_street_suffix_is_case_insensitive() {
        let location = extract_location("4500 EAST WASHINGTON BLVD\nThank you");
        assert_eq!(
            location.store_address.as_deref(),
            Some("4500 EAST WASHINGTON BLVD")
        );
    }

    #[test]
    fn test_long_street_suffix() {
        let location = extract_location("Whole Foods\n88 Ocean Avenue\nSanta Cruz, CA 95060");
        assert_eq!(location.store_address.as_deref(), Some("88 Ocean Avenue"));
        assert_eq!(location.city.as_deref(), Some("Santa Cruz"));
    }
}
