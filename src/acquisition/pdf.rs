//! Page-by-page PDF text extraction with `lopdf`.

use super::AcquisitionError;
use lopdf::Document;
use std::path::Path;

/// Extract text from every page that yields any, joined with newlines.
///
/// Pages whose text cannot be decoded are skipped like blank pages. Only a document that cannot
/// be loaded at all is an error.
pub fn extract_pdf_text(path: &Path) -> Result<String, AcquisitionError> {
    let document = Document::load(path).map_err(|error| AcquisitionError::Extraction {
        path: path.to_path_buf(),
        reason: error.to_string(),
    })?;

    let mut pages = Vec::new();
    for page_number in document.get_pages().keys().copied() {
        match document.extract_text(&[page_number]) {
            Ok(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    pages.push(text.to_string());
                }
            }
            Err(error) => {
                tracing::debug!(
                    path = %path.display(),
                    page = page_number,
                    %error,
                    "Skipping page without extractable text"
                );
            }
        }
    }

    tracing::debug!(
        path = %path.display(),
        pages = pages.len(),
        "Extracted PDF text"
    );
    Ok(pages.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};

    fn page_content(text: Option<&str>) -> Vec<u8> {
        let mut operations = Vec::new();
        if let Some(text) = text {
            operations = vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ];
        }
        Content { operations }.encode().expect("content")
    }

    fn write_pdf(path: &Path, pages: &[Option<&str>]) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            let content_id = doc.add_object(Stream::new(dictionary! {}, page_content(*text)));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).expect("save pdf");
    }

    #[test]
    fn extracts_text_and_skips_blank_pages() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("paper.pdf");
        write_pdf(&path, &[Some("Hello World"), None, Some("Second page")]);

        let text = extract_pdf_text(&path).expect("text");
        assert!(text.contains("Hello World"));
        assert!(text.contains("Second page"));
        assert!(!text.contains("\n\n"));
    }

    #[test]
    fn unreadable_file_is_an_extraction_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"this is not a pdf").expect("write");

        let error = extract_pdf_text(&path).unwrap_err();
        assert!(matches!(error, AcquisitionError::Extraction { .. }));
    }

    #[test]
    fn missing_file_is_an_extraction_error() {
        let error = extract_pdf_text(Path::new("/definitely/not/here.pdf")).unwrap_err();
        assert!(
            matches!(error, AcquisitionError::Extraction { ref path, .. } if path.ends_with("here.pdf"))
        );
    }
}
