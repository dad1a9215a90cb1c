//! "Pozostało do zapłaty" (amount still to pay) extraction.

use super::patterns::AMOUNT_TO_PAY;
use super::FieldExtractor;

/// Extractor for the quoted amount following "Pozostało do zapłaty".
///
/// The captured value keeps the invoice's own formatting: letters, digits,
/// hyphens, slashes and commas are accepted, so `150,00` and `ABC-99` both
/// come through unchanged.
pub struct AmountToPayExtractor;

impl AmountToPayExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AmountToPayExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for AmountToPayExtractor {
    type Output = String;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        AMOUNT_TO_PAY
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

/// Return the first amount still to pay found in `text`.
pub fn extract_amount_to_pay(text: &str) -> Option<String> {
    AmountToPayExtractor::new().extract(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_amount_with_colon() {
        assert_eq!(
            extract_amount_to_pay(r#"Pozostało do zapłaty: "150,00""#),
            Some("150,00".to_string())
        );
    }

    #[test]
    fn test_letters_and_hyphen() {
        assert_eq!(
            extract_amount_to_pay(r#"Pozostało do zapłaty: "ABC-99""#),
            Some("ABC-99".to_string())
        );
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(
            extract_amount_to_pay(r#"POZOSTAŁO DO ZAPŁATY "12/2024""#),
            Some("12/2024".to_string())
        );
        assert_eq!(
            extract_amount_to_pay(r#"pozostało do zapłaty:"abc""#),
            Some("abc".to_string())
        );
    }

    #[test]
    fn test_whitespace_and_newlines_between_label_and_value() {
        let text = "Faktura VAT\nPozostało do zapłaty:\n   \"1,230,00\"\nDziękujemy";
        assert_eq!(extract_amount_to_pay(text), Some("1,230,00".to_string()));
    }

    #[test]
    fn test_no_match() {
        assert_eq!(extract_amount_to_pay("Razem do zapłaty: 1 230,00 zł"), None);
        assert_eq!(extract_amount_to_pay(""), None);
    }

    #[test]
    fn test_unquoted_value_is_not_matched() {
        assert_eq!(extract_amount_to_pay("Pozostało do zapłaty: 150,00"), None);
    }

    #[test]
    fn test_value_with_space_is_not_matched() {
        // The character class has no space, so "1 230,00" cannot be captured.
        assert_eq!(extract_amount_to_pay(r#"Pozostało do zapłaty: "1 230,00""#), None);
    }

    #[test]
    fn test_first_match_wins() {
        let text = r#"Pozostało do zapłaty: "10,00" ... Pozostało do zapłaty: "20,00""#;
        assert_eq!(extract_amount_to_pay(text), Some("10,00".to_string()));
        assert_eq!(AmountToPayExtractor::new().extract(text), Some("10,00".to_string()));
    }
}
