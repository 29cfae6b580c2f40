//! Plain-text extraction from uploaded course material.

pub mod document;

pub use document::{extract_text, DocumentKind, ExtractedText, ExtractionError, MAX_DOCUMENT_BYTES};
