//! Extraction adapters - document understanding service clients.

mod http_extractor;
mod mock_extractor;

pub use http_extractor::{ExtractionConfig, HttpDocumentExtractor};
pub use mock_extractor::MockDocumentExtractor;
