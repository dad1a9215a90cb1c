//! Rule-based field extractors for Polish invoices.

pub mod amount_due;
pub mod patterns;

pub use amount_due::{extract_amount_to_pay, AmountToPayExtractor};
pub use patterns::*;

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the first occurrence of the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;
}
