//! PDF text extraction using lopdf and pdf-extract.

use std::panic::{self, AssertUnwindSafe};

use lopdf::Document;
use tracing::{debug, trace, warn};

use super::{PdfProcessor, Result};
use crate::error::PdfError;

/// PDF text extractor: pdf-extract for text, lopdf for structure and fallback.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
        }
    }

    fn document(&self) -> Result<&Document> {
        self.document
            .as_ref()
            .ok_or(PdfError::Parse("No document loaded".to_string()))
    }

    /// Text of every page in page order, using pdf-extract.
    fn extract_pages(&self) -> Result<Vec<String>> {
        let data = &self.raw_data;
        catch_extraction_panic("pdf-extract", || {
            pdf_extract::extract_text_from_mem_by_pages(data)
                .map_err(|e| PdfError::TextExtraction(e.to_string()))
        })
    }

    /// Text of one page (1-indexed) using lopdf.
    fn extract_page_text_lopdf(&self, page: u32) -> Result<String> {
        let doc = self.document()?;
        catch_extraction_panic("lopdf", || {
            doc.extract_text(&[page])
                .map_err(|e| PdfError::TextExtraction(format!("page {}: {}", page, e)))
        })
    }

    /// Whole-document text using lopdf, page by page.
    fn extract_text_lopdf(&self) -> Result<String> {
        let mut full_text = String::new();
        for page_num in self.document()?.get_pages().keys() {
            match self.extract_page_text_lopdf(*page_num) {
                Ok(text) => full_text.push_str(&text),
                Err(e) => trace!("No text on page {}: {}", page_num, e),
            }
        }
        Ok(full_text)
    }
}

/// Run a text extraction backend, reporting a panic as an extraction error.
///
/// Both backends can panic on malformed font dictionaries.
fn catch_extraction_panic<T>(backend: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|_| {
        Err(PdfError::TextExtraction(format!(
            "{} panicked on this document",
            backend
        )))
    })
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // Save decrypted document to raw_data for pdf_extract
            let mut decrypted_data = Vec::new();
            doc.save_to(&mut decrypted_data)
                .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted_data;
        } else {
            self.raw_data = data.to_vec();
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn extract_text(&self) -> Result<String> {
        self.document()?;

        // Pages are appended in order with nothing added between them, so a
        // match split across a page boundary is not recovered.
        match self.extract_pages() {
            Ok(pages) if pages.iter().any(|p| !p.trim().is_empty()) => Ok(pages.concat()),
            Ok(_) => {
                debug!("pdf-extract found no text, falling back to lopdf");
                self.extract_text_lopdf()
            }
            Err(e) => {
                warn!("pdf-extract failed, falling back to lopdf: {}", e);
                self.extract_text_lopdf()
            }
        }
    }

    fn extract_page_text(&self, page: u32) -> Result<String> {
        self.document()?;

        let index = page.checked_sub(1).map(|i| i as usize);
        match (self.extract_pages(), index) {
            (Ok(pages), Some(i)) if i < pages.len() && !pages[i].trim().is_empty() => {
                Ok(pages[i].clone())
            }
            _ => self.extract_page_text_lopdf(page),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::testing::{broken_type0_font, build_pdf, build_pdf_with_font};

    #[test]
    fn test_extract_text_concatenates_pages_in_order() {
        let data = build_pdf(&[b"First page".as_slice(), b"Second page".as_slice()]);
        let mut extractor = PdfExtractor::new();
        extractor.load(&data).unwrap();

        assert_eq!(extractor.page_count(), 2);

        let text = extractor.extract_text().unwrap();
        let first = text.find("First page").unwrap();
        let second = text.find("Second page").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_encoding_differences_are_applied() {
        let data = build_pdf(&[b"Pozosta\xC8o do zap\xC8aty: \"150,00\"".as_slice()]);
        let mut extractor = PdfExtractor::new();
        extractor.load(&data).unwrap();

        let text = extractor.extract_text().unwrap();
        assert!(text.contains("Pozostało do zapłaty"), "got {:?}", text);
    }

    #[test]
    fn test_extract_page_text() {
        let data = build_pdf(&[b"First page".as_slice(), b"Second page".as_slice()]);
        let mut extractor = PdfExtractor::new();
        extractor.load(&data).unwrap();

        assert!(extractor.extract_page_text(2).unwrap().contains("Second page"));
        assert!(!extractor.extract_page_text(2).unwrap().contains("First page"));
    }

    #[test]
    fn test_malformed_font_does_not_panic() {
        let data = build_pdf_with_font(broken_type0_font(), &[b"Faktura".as_slice()]);
        let mut extractor = PdfExtractor::new();
        extractor.load(&data).unwrap();

        assert!(matches!(
            extractor.extract_pages(),
            Err(PdfError::TextExtraction(_))
        ));
        // Falls back to lopdf instead of unwinding; no amount can be read.
        let text = extractor.extract_text().unwrap_or_default();
        assert!(!text.contains("150,00"));
    }

    #[test]
    fn test_pdf_extractor_new() {
        let extractor = PdfExtractor::new();
        assert!(extractor.document.is_none());
        assert_eq!(extractor.page_count(), 0);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let mut extractor = PdfExtractor::new();
        let result = extractor.load(b"this is not a pdf");
        assert!(matches!(result, Err(PdfError::Parse(_))));
    }

    #[test]
    fn test_extract_without_document() {
        let extractor = PdfExtractor::new();
        assert!(extractor.extract_text().is_err());
        assert!(extractor.extract_page_text(1).is_err());
    }
}
