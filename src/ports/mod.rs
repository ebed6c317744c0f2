//! Ports - interfaces to external collaborators.
//!
//! The engine depends only on these traits; adapters provide the real
//! completion service, extraction service, and session store.

mod completion;
mod extractor;
mod session_store;

pub use completion::{CompletionError, CompletionProvider, CompletionRequest};
pub use extractor::{Attachment, DocumentExtractor, ExtractionError, ExtractionResult};
pub use session_store::{SessionStore, StoreError};
