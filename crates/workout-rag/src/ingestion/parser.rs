//! Document parsing into per-page text

use crate::error::{Error, Result};
use crate::types::{FileType, PageText};

/// Turns an uploaded file into page texts
pub trait DocumentParser: Send + Sync {
    /// Parse file bytes; `filename` selects the format
    fn parse(&self, filename: &str, data: &[u8]) -> Result<Vec<PageText>>;
}

/// Glyph names some PDF fonts leak into extracted text
const GLYPH_NAMES: &[(&str, &str)] = &[
    ("uni2010", "-"),
    ("uni2013", "-"),
    ("uni2014", "--"),
    ("uni2018", "'"),
    ("uni2019", "'"),
    ("uni201C", "\""),
    ("uni201D", "\""),
    ("uni2022", "* "),
    ("uni2026", "..."),
    ("uni00A0", " "),
];

/// Replacements for typographic characters and ligatures
const CHAR_REPLACEMENTS: &[(char, &str)] = &[
    ('\u{2010}', "-"),
    ('\u{2011}', "-"),
    ('\u{2013}', "-"),
    ('\u{2014}', "--"),
    ('\u{2018}', "'"),
    ('\u{2019}', "'"),
    ('\u{201C}', "\""),
    ('\u{201D}', "\""),
    ('\u{2022}', "* "),
    ('\u{2026}', "..."),
    ('\u{00A0}', " "),
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
    ('\0', ""),
];

/// Normalise extracted PDF text: glyph names, ligatures, quotes, blank lines
pub fn cleanup_pdf_text(text: &str) -> String {
    let mut result = text.to_string();
    for (glyph, replacement) in GLYPH_NAMES {
        result = result.replace(&format!("<{}>", glyph), replacement);
        result = result.replace(&format!("({})", glyph), replacement);
    }
    for (c, replacement) in CHAR_REPLACEMENTS {
        result = result.replace(*c, replacement);
    }

    // Keep paragraph breaks (one blank line) so the chunker can use them
    let mut out = String::with_capacity(result.len());
    let mut blank_run = 0;
    for line in result.lines().map(str::trim_end) {
        if line.trim().is_empty() {
            blank_run += 1;
            continue;
        }
        if !out.is_empty() {
            out.push_str(if blank_run > 0 { "\n\n" } else { "\n" });
        }
        out.push_str(line.trim_start());
        blank_run = 0;
    }
    out
}

/// PDF and plain-text parser
#[derive(Debug, Clone, Default)]
pub struct FileParser;

impl FileParser {
    pub fn new() -> Self {
        Self
    }

    /// Per-page extraction with lopdf, falling back to pdf-extract for the whole file
    fn parse_pdf(filename: &str, data: &[u8]) -> Result<Vec<PageText>> {
        let pages = match lopdf::Document::load_mem(data) {
            Ok(doc) => {
                let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
                tracing::debug!("{}: {} pages", filename, page_numbers.len());
                page_numbers
                    .into_iter()
                    .filter_map(|number| match doc.extract_text(&[number]) {
                        Ok(text) => Some(PageText {
                            page_number: Some(number),
                            text: cleanup_pdf_text(&text),
                        }),
                        Err(e) => {
                            tracing::debug!("Could not extract page {} of {}: {}", number, filename, e);
                            None
                        }
                    })
                    .filter(|page| !page.text.is_empty())
                    .collect::<Vec<_>>()
            }
            Err(e) => {
                tracing::warn!("lopdf could not load {}: {}, trying pdf-extract", filename, e);
                Vec::new()
            }
        };

        if !pages.is_empty() {
            return Ok(pages);
        }

        let text = pdf_extract::extract_text_from_mem(data)
            .map_err(|e| Error::file_parse(filename, format!("Failed to extract PDF text: {}", e)))?;
        let text = cleanup_pdf_text(&text);
        if text.is_empty() {
            return Err(Error::file_parse(
                filename,
                "No text content could be extracted from PDF (image-based or encrypted?)",
            ));
        }
        Ok(vec![PageText {
            page_number: None,
            text,
        }])
    }

    fn parse_text(filename: &str, data: &[u8]) -> Result<Vec<PageText>> {
        let text = String::from_utf8_lossy(data).replace("\r\n", "\n");
        if text.trim().is_empty() {
            return Err(Error::file_parse(filename, "File is empty"));
        }
        Ok(vec![PageText {
            page_number: None,
            text,
        }])
    }
}

impl DocumentParser for FileParser {
    fn parse(&self, filename: &str, data: &[u8]) -> Result<Vec<PageText>> {
        match FileType::from_filename(filename) {
            FileType::Pdf => Self::parse_pdf(filename, data),
            FileType::Txt | FileType::Markdown => Self::parse_text(filename, data),
            FileType::Unknown => Err(Error::UnsupportedFileType(format!(
                "{} - only PDF, TXT and Markdown files are accepted",
                filename
            ))),
        }
    }
}
