//! PDF source: one document per page.

use std::path::Path;

use docsearch_types::{metadata_from_pairs, META_FILE_NAME, META_SOURCE, META_TITLE};
use lopdf::Document;
use tracing::{debug, info};

use crate::error::IngestError;
use crate::sources::SourceDocument;

/// Value of the `source` metadata key for PDF chunks
pub const PDF_SOURCE: &str = "pdf";

/// Pages with less trimmed text than this get placeholder content
const MIN_PAGE_CHARS: usize = 10;

/// Extract every page of the PDF at `path`.
pub fn load_pdf(path: impl AsRef<Path>) -> Result<Vec<SourceDocument>, IngestError> {
    let path = path.as_ref();
    let doc = Document::load(path)?;
    let pages = doc.get_pages();
    let total_pages = pages.len();

    let page_texts = pages
        .keys()
        .map(|&number| {
            // Image-only or malformed pages fall back to placeholder text
            doc.extract_text(&[number]).unwrap_or_else(|e| {
                debug!(page = number, error = %e, "No extractable text on page");
                String::new()
            })
        })
        .collect::<Vec<_>>();

    let documents = pages_to_documents(path, page_texts);
    info!(path = ?path, pages = total_pages, "Loaded PDF");
    Ok(documents)
}

/// Build per-page documents with provenance metadata.
pub fn pages_to_documents(path: &Path, page_texts: Vec<String>) -> Vec<SourceDocument> {
    let file_path = path.display().to_string();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_path.clone());
    let title = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.clone());
    let total_pages = page_texts.len();

    page_texts
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            let page = i + 1;
            let text = if text.trim().chars().count() < MIN_PAGE_CHARS {
                format!("Content from {} - Page {}", title, page)
            } else {
                text
            };
            let metadata = metadata_from_pairs([
                (META_SOURCE, PDF_SOURCE.to_string()),
                ("file_path", file_path.clone()),
                (META_FILE_NAME, file_name.clone()),
                (META_TITLE, title.clone()),
                ("page", page.to_string()),
                ("total_pages", total_pages.to_string()),
            ]);
            SourceDocument::new(text, metadata)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_page_metadata() {
        let path = PathBuf::from("/docs/Field Manual.pdf");
        let docs = pages_to_documents(
            &path,
            vec![
                "The first page has plenty of text.".to_string(),
                "Page two is also long enough.".to_string(),
            ],
        );

        assert_eq!(docs.len(), 2);
        let meta = &docs[1].metadata;
        assert_eq!(meta.get("source").unwrap(), "pdf");
        assert_eq!(meta.get("file_path").unwrap(), "/docs/Field Manual.pdf");
        assert_eq!(meta.get("file_name").unwrap(), "Field Manual.pdf");
        assert_eq!(meta.get("title").unwrap(), "Field Manual");
        assert_eq!(meta.get("page").unwrap(), "2");
        assert_eq!(meta.get("total_pages").unwrap(), "2");
        assert_eq!(docs[0].text, "The first page has plenty of text.");
    }

    #[test]
    fn test_sparse_page_gets_placeholder() {
        let path = PathBuf::from("scan.pdf");
        let docs = pages_to_documents(&path, vec!["   fig 1  ".to_string(), String::new()]);
        assert_eq!(docs[0].text, "Content from scan - Page 1");
        assert_eq!(docs[1].text, "Content from scan - Page 2");
    }

    #[test]
    fn test_invalid_pdf_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.pdf");
        std::fs::write(&path, b"definitely not a pdf").unwrap();
        assert!(matches!(load_pdf(&path), Err(IngestError::Pdf(_))));
    }

    #[test]
    fn test_missing_pdf_is_error() {
        let temp = TempDir::new().unwrap();
        assert!(load_pdf(temp.path().join("absent.pdf")).is_err());
    }
}
