//! Regex patterns for Polish invoice fields.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Amount still to pay, quoted: Pozostało do zapłaty: "150,00"
    pub static ref AMOUNT_TO_PAY: Regex = Regex::new(
        r#"(?i)Pozostało do zapłaty[:\s]*"([A-Z0-9\-/,]+)""#
    ).unwrap();
}
