#[cfg(feature = "docx")]
mod docx;
#[cfg(feature = "pdf")]
mod pdf;
mod txt;

use thiserror::Error;

/// Largest document the extractor will look at (20 MiB).
pub const MAX_DOCUMENT_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("File too large ({size} bytes, limit is {limit} bytes)")]
    PayloadTooLarge { size: usize, limit: usize },
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),
    #[error("Missing dependency: {0} support is not compiled in")]
    MissingCapability(&'static str),
    #[error("PDF extraction failed: {0}")]
    PdfError(String),
    #[error("DOCX extraction failed: {0}")]
    DocxError(String),
}

/// Document formats accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    Txt,
}

impl DocumentKind {
    pub const ALLOWED: &'static [&'static str] = &["pdf", "docx", "txt"];

    /// Map a file name to a kind by its extension (case-insensitive).
    /// Names without a `.` have no extension and are rejected.
    pub fn from_file_name(file_name: &str) -> Result<Self, ExtractionError> {
        let ext = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .ok_or_else(|| ExtractionError::UnsupportedFileType(file_name.to_string()))?;
        Self::from_extension(&ext)
    }

    pub fn from_extension(ext: &str) -> Result<Self, ExtractionError> {
        match ext.to_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            "txt" => Ok(Self::Txt),
            other => Err(ExtractionError::UnsupportedFileType(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Txt => "txt",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of extracting text from a document.
#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub content: String,
    /// Original filename, passed through untouched.
    pub source_file_name: String,
}

impl ExtractedText {
    /// True when nothing but whitespace came out of the document.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }

    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }
}

/// Extract text from file bytes of a known kind.
pub fn extract_text(
    bytes: &[u8],
    kind: DocumentKind,
    file_name: &str,
) -> Result<ExtractedText, ExtractionError> {
    if bytes.len() > MAX_DOCUMENT_BYTES {
        return Err(ExtractionError::PayloadTooLarge {
            size: bytes.len(),
            limit: MAX_DOCUMENT_BYTES,
        });
    }

    let content = match kind {
        DocumentKind::Txt => txt::extract_txt(bytes),
        DocumentKind::Pdf => extract_pdf(bytes)?,
        DocumentKind::Docx => extract_docx(bytes)?,
    };

    tracing::debug!(
        "Extracted {} chars from '{}' ({})",
        content.chars().count(),
        file_name,
        kind
    );

    Ok(ExtractedText {
        content,
        source_file_name: file_name.to_string(),
    })
}

#[cfg(feature = "pdf")]
fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractionError> {
    pdf::extract_pdf(bytes)
}

#[cfg(not(feature = "pdf"))]
fn extract_pdf(_bytes: &[u8]) -> Result<String, ExtractionError> {
    Err(ExtractionError::MissingCapability("pdf"))
}

#[cfg(feature = "docx")]
fn extract_docx(bytes: &[u8]) -> Result<String, ExtractionError> {
    docx::extract_docx(bytes)
}

#[cfg(not(feature = "docx"))]
fn extract_docx(_bytes: &[u8]) -> Result<String, ExtractionError> {
    Err(ExtractionError::MissingCapability("docx"))
}
