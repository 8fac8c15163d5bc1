//! Document text extraction
//!
//! Turns supported document files (plain text, Markdown, PDF, DOCX) into
//! plain text ready for chunking. Format is decided by file extension; the
//! extractors strip markup but preserve paragraph structure, since the
//! chunker keys on blank lines.

use crate::error::{Error, Result};
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Maximum file size accepted for extraction (50MB)
const MAX_DOC_SIZE: u64 = 50 * 1024 * 1024;

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Text,
    Markdown,
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Detect the format from a file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "txt" | "text" | "log" => Ok(DocumentFormat::Text),
            "md" | "markdown" => Ok(DocumentFormat::Markdown),
            "pdf" => Ok(DocumentFormat::Pdf),
            "docx" => Ok(DocumentFormat::Docx),
            "" => Err(Error::UnsupportedFormat(format!(
                "{} has no file extension",
                path.display()
            ))),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }

    /// Extensions accepted by `from_path`
    pub fn supported_extensions() -> &'static [&'static str] {
        &["txt", "text", "log", "md", "markdown", "pdf", "docx"]
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentFormat::Text => write!(f, "text"),
            DocumentFormat::Markdown => write!(f, "markdown"),
            DocumentFormat::Pdf => write!(f, "pdf"),
            DocumentFormat::Docx => write!(f, "docx"),
        }
    }
}

/// Extract plain text from a document file
///
/// Returns the extracted text with normalized line endings. An empty result
/// is not an error; callers decide how to handle documents with no
/// extractable text.
pub fn extract_text(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(Error::InvalidPath(format!(
            "{} is not a readable file",
            path.display()
        )));
    }
    check_file_size(path)?;

    let format = DocumentFormat::from_path(path)?;
    debug!("Extracting {:?} as {}", path, format);

    let text = match format {
        DocumentFormat::Text => extract_plain(path)?,
        DocumentFormat::Markdown => extract_markdown(path)?,
        DocumentFormat::Pdf => extract_pdf(path)?,
        DocumentFormat::Docx => extract_docx(path)?,
    };

    Ok(normalize_text(&text))
}

fn check_file_size(path: &Path) -> Result<()> {
    let size = std::fs::metadata(path)?.len();
    if size > MAX_DOC_SIZE {
        return Err(Error::extraction(
            path,
            format!(
                "file too large: {:.1} MB (max {:.1} MB)",
                size as f64 / (1024.0 * 1024.0),
                MAX_DOC_SIZE as f64 / (1024.0 * 1024.0)
            ),
        ));
    }
    Ok(())
}

fn extract_plain(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| Error::extraction(path, format!("failed to read file: {}", e)))
}

/// Render Markdown down to plain text, keeping paragraph breaks
fn extract_markdown(path: &Path) -> Result<String> {
    let source = extract_plain(path)?;
    let parser = pulldown_cmark::Parser::new(&source);

    let mut text = String::with_capacity(source.len());
    for event in parser {
        use pulldown_cmark::{Event, TagEnd};
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak => text.push('\n'),
            Event::End(TagEnd::Paragraph)
            | Event::End(TagEnd::Heading(_))
            | Event::End(TagEnd::Item)
            | Event::End(TagEnd::CodeBlock)
            | Event::End(TagEnd::BlockQuote(_)) => text.push_str("\n\n"),
            _ => {}
        }
    }
    Ok(text)
}

/// Extract PDF text; pdf-extract separates pages with form feeds
#[cfg(feature = "pdf")]
fn extract_pdf(path: &Path) -> Result<String> {
    let text = pdf_extract::extract_text(path)
        .map_err(|e| Error::extraction(path, format!("failed to extract PDF text: {}", e)))?;

    let pages: Vec<String> = text
        .split('\x0c')
        .map(|page| page.trim().to_string())
        .filter(|page| !page.is_empty())
        .collect();

    Ok(pages.join("\n\n"))
}

#[cfg(not(feature = "pdf"))]
fn extract_pdf(path: &Path) -> Result<String> {
    Err(Error::extraction(
        path,
        "PDF support was not compiled in (enable the 'pdf' feature)",
    ))
}

/// Extract DOCX text from the word/document.xml entry of the archive
///
/// Text lives in <w:t> runs; <w:p> elements delimit paragraphs.
fn extract_docx(path: &Path) -> Result<String> {
    let file = std::fs::File::open(path)
        .map_err(|e| Error::extraction(path, format!("failed to open file: {}", e)))?;

    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| Error::extraction(path, format!("not a valid DOCX archive: {}", e)))?;

    let mut doc_xml = String::new();
    {
        let mut entry = archive
            .by_name("word/document.xml")
            .map_err(|_| Error::extraction(path, "missing word/document.xml"))?;
        entry
            .read_to_string(&mut doc_xml)
            .map_err(|e| Error::extraction(path, format!("failed to read document.xml: {}", e)))?;
    }

    let mut reader = quick_xml::Reader::from_str(&doc_xml);
    let mut paragraphs: Vec<String> = Vec::new();
    let mut paragraph = String::new();
    let mut in_text_run = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(ref e)) => {
                match e.local_name().as_ref() {
                    b"p" => paragraph.clear(),
                    b"t" => in_text_run = true,
                    _ => {}
                }
            }
            Ok(quick_xml::events::Event::End(ref e)) => match e.local_name().as_ref() {
                b"p" => {
                    if !paragraph.trim().is_empty() {
                        paragraphs.push(paragraph.trim().to_string());
                    }
                    paragraph.clear();
                }
                b"t" => in_text_run = false,
                _ => {}
            },
            Ok(quick_xml::events::Event::Text(ref e)) => {
                if in_text_run {
                    let text = e
                        .unescape()
                        .map_err(|e| Error::extraction(path, format!("XML decode error: {}", e)))?;
                    paragraph.push_str(&text);
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => {
                return Err(Error::extraction(path, format!("XML parse error: {}", e)));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs.join("\n\n"))
}

/// Normalize line endings and trim outer whitespace
fn normalize_text(text: &str) -> String {
    text.replace("\r\n", "\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_format_detection() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("notes.txt")).unwrap(),
            DocumentFormat::Text
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("README.MD")).unwrap(),
            DocumentFormat::Markdown
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("paper.pdf")).unwrap(),
            DocumentFormat::Pdf
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("report.docx")).unwrap(),
            DocumentFormat::Docx
        );
    }

    #[test]
    fn test_unsupported_formats_are_rejected() {
        let err = DocumentFormat::from_path(Path::new("image.png")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));

        let err = DocumentFormat::from_path(Path::new("Makefile")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn test_missing_file_is_invalid_path() {
        let err = extract_text(Path::new("/nonexistent/notes.txt")).unwrap_err();
        assert!(matches!(err, Error::InvalidPath(_)));
    }

    #[test]
    fn test_extract_plain_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "First line.\r\nSecond line.\n").unwrap();

        let text = extract_text(&path).unwrap();
        assert_eq!(text, "First line.\nSecond line.");
    }

    #[test]
    fn test_extract_markdown_strips_markup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.md");
        std::fs::write(
            &path,
            "# Title\n\nSome *emphasized* text with `inline code`.\n\n- first item\n- second item\n",
        )
        .unwrap();

        let text = extract_text(&path).unwrap();
        assert!(text.contains("Title"));
        assert!(text.contains("Some emphasized text with inline code."));
        assert!(text.contains("first item"));
        assert!(!text.contains('#'));
        assert!(!text.contains('*'));
        assert!(!text.contains('`'));
        // Heading and body stay separate paragraphs
        assert!(text.contains("Title\n\n"));
    }

    #[test]
    fn test_extract_docx_paragraphs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.docx");
        write_test_docx(&path, &["First paragraph.", "Second paragraph."]);

        let text = extract_text(&path).unwrap();
        assert_eq!(text, "First paragraph.\n\nSecond paragraph.");
    }

    #[test]
    fn test_extract_docx_unescapes_entities() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("entities.docx");
        write_test_docx(&path, &["Fish &amp; chips"]);

        let text = extract_text(&path).unwrap();
        assert_eq!(text, "Fish & chips");
    }

    #[test]
    fn test_corrupt_docx_is_extraction_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.docx");
        std::fs::write(&path, b"this is not a zip archive").unwrap();

        let err = extract_text(&path).unwrap_err();
        assert!(matches!(err, Error::Extraction { .. }));
    }

    #[test]
    fn test_empty_document_extracts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.txt");
        std::fs::write(&path, "   \n  \n").unwrap();

        let text = extract_text(&path).unwrap();
        assert!(text.is_empty());
    }

    /// Build a minimal DOCX: a ZIP with a word/document.xml of w:p/w:r/w:t
    /// paragraphs. `paragraphs` entries are raw XML text content.
    fn write_test_docx(path: &Path, paragraphs: &[&str]) {
        let mut body = String::new();
        for p in paragraphs {
            body.push_str(&format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p));
        }
        let document = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:body>{}</w:body></w:document>"#,
            body
        );

        let file = std::fs::File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file("word/document.xml", options).unwrap();
        writer.write_all(document.as_bytes()).unwrap();
        writer.finish().unwrap();
    }
}
