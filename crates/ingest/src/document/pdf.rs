use lopdf::Document;

use super::ExtractionError;

/// Extract text page by page. A page whose content stream can't be decoded
/// contributes an empty line instead of failing the document.
///
/// When lopdf gets no text out of any page, pdf-extract gets a second look and
/// its output is used if it found more.
pub fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractionError> {
    // pdf-extract parses through lopdf too, so a load failure here is final.
    let doc = Document::load_mem(bytes).map_err(|e| ExtractionError::PdfError(e.to_string()))?;

    let pages: Vec<String> = doc
        .get_pages()
        .into_keys()
        .map(|page_num| match doc.extract_text(&[page_num]) {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!("Skipping text of PDF page {page_num}: {e}");
                String::new()
            }
        })
        .collect();

    let pages = prefer_richer(pages, || extract_whole_document(bytes));
    Ok(join_pages(&pages))
}

/// Keep `primary` unless it has no printable text and `fallback` does.
fn prefer_richer<F>(primary: Vec<String>, fallback: F) -> Vec<String>
where
    F: FnOnce() -> Result<Vec<String>, ExtractionError>,
{
    if printable_chars(&primary) > 0 {
        return primary;
    }
    match fallback() {
        Ok(pages) if printable_chars(&pages) > 0 => {
            tracing::info!(
                "Using pdf-extract output ({} chars), lopdf found no text",
                printable_chars(&pages)
            );
            pages
        }
        Ok(_) => {
            tracing::warn!("PDF has no extractable text (scanned or image-only?)");
            primary
        }
        Err(e) => {
            tracing::warn!("lopdf found no text and pdf-extract failed: {e}");
            primary
        }
    }
}

/// Whole-document pass. pdf-extract separates pages with form feeds.
fn extract_whole_document(bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| ExtractionError::PdfError(e.to_string()))?;
    Ok(text.split('\x0C').map(str::to_string).collect())
}

fn printable_chars(pages: &[String]) -> usize {
    pages
        .iter()
        .flat_map(|p| p.chars())
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .count()
}

fn join_pages(pages: &[String]) -> String {
    pages
        .iter()
        .map(|p| p.trim_end_matches('\n'))
        .collect::<Vec<_>>()
        .join("\n")
}
