//! Document ingestion: turns an uploaded resume or job posting into plain text.
//!
//! `.pdf` → pdf-extract, `.docx` → `word/document.xml` via zip + quick-xml,
//! anything else → lossy UTF-8. Output is capped at `MAX_CHARS` characters.

pub mod handlers;

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

pub const MAX_CHARS: usize = 250_000;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("could not read PDF: {0}")]
    Pdf(String),

    #[error("could not read DOCX: {0}")]
    Docx(String),

    #[error("extraction worker failed: {0}")]
    Worker(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentKind {
    Pdf,
    Docx,
    PlainText,
}

impl DocumentKind {
    fn from_filename(filename: &str) -> Self {
        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "pdf" => DocumentKind::Pdf,
            "docx" => DocumentKind::Docx,
            _ => DocumentKind::PlainText,
        }
    }
}

/// Extracts text from `bytes`, choosing the parser from `filename`'s extension.
///
/// CPU-bound; call from `spawn_blocking` inside async handlers.
pub fn extract_text(filename: &str, bytes: &[u8]) -> Result<String, IngestError> {
    let text = match DocumentKind::from_filename(filename) {
        DocumentKind::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| IngestError::Pdf(e.to_string()))?,
        DocumentKind::Docx => docx_text(bytes)?,
        DocumentKind::PlainText => String::from_utf8_lossy(bytes).into_owned(),
    };
    Ok(truncate_chars(text, MAX_CHARS))
}

/// Text of every `<w:p>` paragraph, one per line.
///
/// Paragraphs nested in text boxes come out as their own lines ahead of the
/// paragraph that holds them. `<w:tab/>` and `<w:br/>` inside a run become `\t`
/// and `\n`. `mc:Fallback` copies of text boxes are skipped.
fn docx_text(bytes: &[u8]) -> Result<String, IngestError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| IngestError::Docx(format!("not a ZIP archive: {e}")))?;

    let mut document_xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|_| IngestError::Docx("missing word/document.xml".to_string()))?
        .read_to_string(&mut document_xml)
        .map_err(|e| IngestError::Docx(format!("unreadable word/document.xml: {e}")))?;

    let mut reader = Reader::from_str(&document_xml);
    let mut paragraphs: Vec<String> = Vec::new();
    // one buffer per open <w:p>, innermost last
    let mut open_paragraphs: Vec<String> = Vec::new();
    // local names of the open elements
    let mut open: Vec<Vec<u8>> = Vec::new();

    loop {
        let in_fallback = open.iter().any(|name| name == b"Fallback");
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.local_name().as_ref().to_vec();
                if name == b"p" {
                    open_paragraphs.push(String::new());
                }
                open.push(name);
            }
            Ok(Event::End(e)) => {
                open.pop();
                if e.local_name().as_ref() == b"p" {
                    if let Some(text) = open_paragraphs.pop() {
                        if !in_fallback {
                            paragraphs.push(text);
                        }
                    }
                }
            }
            Ok(Event::Empty(e)) if !in_fallback => {
                let in_run = open.last().is_some_and(|parent| parent == b"r");
                match e.local_name().as_ref() {
                    // self-closing <w:p/> is an empty paragraph
                    b"p" => paragraphs.push(String::new()),
                    b"tab" if in_run => push_text(&mut open_paragraphs, "\t"),
                    b"br" | b"cr" if in_run => push_text(&mut open_paragraphs, "\n"),
                    _ => {}
                }
            }
            Ok(Event::Text(e)) if !in_fallback && open.last().is_some_and(|n| n == b"t") => {
                let text = e
                    .unescape()
                    .map_err(|err| IngestError::Docx(format!("bad text run: {err}")))?;
                push_text(&mut open_paragraphs, &text);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(IngestError::Docx(format!("XML parse error: {e}"))),
            _ => {}
        }
    }

    Ok(paragraphs.join("\n"))
}

fn push_text(open_paragraphs: &mut [String], text: &str) {
    if let Some(current) = open_paragraphs.last_mut() {
        current.push_str(text);
    }
}

fn truncate_chars(mut text: String, max_chars: usize) -> String {
    if let Some((byte_index, _)) = text.char_indices().nth(max_chars) {
        text.truncate(byte_index);
    }
    text
}
