//! Document text extraction. PDF and DOCX are parsed on the blocking pool;
//! plain text is decoded as UTF-8.

use std::io::{Cursor, Read};

use bytes::Bytes;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;
use zip::ZipArchive;

use crate::errors::AppError;

const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    PlainText,
    Docx,
    Unknown,
}

impl DocumentFormat {
    /// The filename extension wins over the declared content type, since
    /// browsers often send `application/octet-stream`.
    pub fn detect(filename: &str, content_type: Option<&str>) -> Self {
        let lower = filename.to_ascii_lowercase();
        if lower.ends_with(".pdf") {
            return DocumentFormat::Pdf;
        }
        if lower.ends_with(".txt") || lower.ends_with(".md") {
            return DocumentFormat::PlainText;
        }
        if lower.ends_with(".docx") {
            return DocumentFormat::Docx;
        }

        match content_type.map(|ct| ct.split(';').next().unwrap_or(ct).trim()) {
            Some("application/pdf") => DocumentFormat::Pdf,
            Some(ct) if ct.starts_with("text/") => DocumentFormat::PlainText,
            Some(DOCX_CONTENT_TYPE) => DocumentFormat::Docx,
            _ => DocumentFormat::Unknown,
        }
    }
}

/// Returns the document's text, trimmed. Empty documents are an extraction error.
pub async fn extract_text(
    bytes: Bytes,
    filename: &str,
    content_type: Option<&str>,
) -> Result<String, AppError> {
    let format = DocumentFormat::detect(filename, content_type);
    debug!("Extracting {filename} as {format:?} ({} bytes)", bytes.len());

    let text = match format {
        DocumentFormat::Pdf => tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem(&bytes)
        })
        .await
        // pdf-extract panics on some malformed files.
        .map_err(|_| AppError::Extraction(format!("{filename}: unreadable PDF")))?
        .map_err(|e| AppError::Extraction(format!("{filename}: {e}")))?,
        DocumentFormat::PlainText => String::from_utf8(bytes.to_vec())
            .map_err(|_| AppError::Extraction(format!("{filename}: text is not valid UTF-8")))?,
        DocumentFormat::Docx => tokio::task::spawn_blocking(move || docx_text(&bytes))
            .await
            .map_err(|_| AppError::Extraction(format!("{filename}: unreadable DOCX")))?
            .map_err(|e| AppError::Extraction(format!("{filename}: unreadable DOCX ({e})")))?,
        DocumentFormat::Unknown => {
            return Err(AppError::UnsupportedFormat(format!(
                "{filename}: expected a PDF, DOCX or plain text file"
            )))
        }
    };

    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::Extraction(format!("{filename}: no text found")));
    }
    Ok(text.to_string())
}

/// Paragraph text from `word/document.xml`, one line per `<w:p>`.
fn docx_text(bytes: &[u8]) -> Result<String, String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| e.to_string())?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| e.to_string())?
        .read_to_string(&mut xml)
        .map_err(|e| e.to_string())?;

    let mut reader = Reader::from_str(&xml);
    let mut text = String::new();
    let mut in_run_text = false;
    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(tag) if tag.name().as_ref() == b"w:t" => in_run_text = true,
            Event::End(tag) => match tag.name().as_ref() {
                b"w:t" => in_run_text = false,
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Event::Empty(tag) => match tag.name().as_ref() {
                b"w:tab" => text.push('\t'),
                b"w:br" | b"w:p" => text.push('\n'),
                _ => {}
            },
            Event::Text(run) if in_run_text => {
                text.push_str(&run.unescape().map_err(|e| e.to_string())?);
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(text)
}
