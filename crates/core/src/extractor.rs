use crate::error::IngestError;
use lopdf::Document;
use tracing::debug;

/// Converts a PDF byte stream into one linear, page-delimited text string.
pub trait PdfExtract: Send + Sync {
    fn extract(&self, pdf_bytes: &[u8]) -> Result<String, IngestError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfExtractor;

impl PdfExtract for LopdfExtractor {
    fn extract(&self, pdf_bytes: &[u8]) -> Result<String, IngestError> {
        let document = Document::load_mem(pdf_bytes)
            .map_err(|error| IngestError::Extraction(error.to_string()))?;

        // Encryption is checked before any extraction is attempted.
        if document.trailer.get(b"Encrypt").is_ok() {
            return Err(IngestError::Encrypted);
        }

        let mut text = String::new();
        for (page_number, _page_id) in document.get_pages() {
            let page_text = match document.extract_text(&[page_number]) {
                Ok(value) => value,
                Err(error) => {
                    debug!(page = page_number, error = %error, "skipping unreadable page");
                    continue;
                }
            };

            if page_text.trim().is_empty() {
                continue;
            }

            text.push_str(&format!("\n--- Page {page_number} ---\n"));
            text.push_str(&page_text);
        }

        if text.trim().is_empty() {
            return Err(IngestError::Empty);
        }

        Ok(text)
    }
}
