/// PDF text extraction.
///
/// `pdf-extract` is synchronous and can take seconds on large documents, so decoding
/// runs on the blocking pool like embedding does.
use crate::error::CommonError;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Extract the text of every page, in page order, from an in-memory PDF.
pub async fn extract_pdf_text(bytes: Vec<u8>) -> Result<String, CommonError> {
    if !bytes.starts_with(PDF_MAGIC) {
        return Err(CommonError::Pdf("missing %PDF- header".to_string()));
    }
    let size = bytes.len();
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| CommonError::Pdf(format!("spawn_blocking join error: {e}")))?
        .map_err(|e| CommonError::Pdf(format!("text extraction failed: {e}")))?;
    tracing::debug!(bytes = size, chars = text.chars().count(), "pdf text extracted");
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_non_pdf_bytes() {
        let err = extract_pdf_text(b"hello world".to_vec()).await.unwrap_err();
        assert!(matches!(err, CommonError::Pdf(ref m) if m.contains("%PDF-")));
    }

    #[tokio::test]
    async fn truncated_pdf_is_an_error() {
        let err = extract_pdf_text(b"%PDF-1.4\n".to_vec()).await.unwrap_err();
        assert!(matches!(err, CommonError::Pdf(_)));
    }
}
