//! Document and chunk types with source tracking for citations

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Supported file types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// Plain text file
    Txt,
    /// Markdown file
    Markdown,
    /// Unknown file type
    Unknown,
}

impl FileType {
    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "txt" | "text" => Self::Txt,
            "md" | "markdown" => Self::Markdown,
            _ => Self::Unknown,
        }
    }

    /// Detect file type from a filename
    pub fn from_filename(filename: &str) -> Self {
        match filename.rsplit_once('.') {
            Some((_, ext)) => Self::from_extension(ext),
            None => Self::Unknown,
        }
    }

    /// Check if this is a supported file type
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Short tag stored in chunk metadata
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Txt => "txt",
            Self::Markdown => "markdown",
            Self::Unknown => "unknown",
        }
    }
}

/// Derive the document identity from an upload name or path.
///
/// Only the basename is kept, so two files with the same name in different
/// directories map to the same identity.
pub fn source_identity(path_or_name: &str) -> String {
    path_or_name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(path_or_name)
        .to_string()
}

/// A contiguous span of extracted text from a source document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentChunk {
    /// Chunk text
    pub text: String,
    /// Basename of the source file
    pub source_file_path: String,
    /// 0-based position in the document's split sequence
    pub chunk_id: u32,
    /// Source file type
    pub file_type: FileType,
    /// Page the chunk starts on, when the format has pages
    #[serde(default)]
    pub page_number: Option<u32>,
    /// Number of chunks produced for this document
    pub total_chunks: u32,
}

impl DocumentChunk {
    /// Metadata as stored alongside the embedding
    pub fn to_metadata(&self) -> HashMap<String, serde_json::Value> {
        let mut meta = HashMap::new();
        meta.insert("source_file_path".to_string(), serde_json::json!(self.source_file_path));
        meta.insert("chunk_id".to_string(), serde_json::json!(self.chunk_id));
        meta.insert("file_type".to_string(), serde_json::json!(self.file_type.as_str()));
        meta.insert("total_chunks".to_string(), serde_json::json!(self.total_chunks));
        meta.insert(
            "page_number".to_string(),
            match self.page_number {
                Some(page) => serde_json::json!(page),
                None => serde_json::json!("unknown"),
            },
        );
        meta
    }

    /// Page label for citations ("unknown" when the format carries no pages)
    pub fn page_label(&self) -> String {
        self.page_number
            .map(|p| p.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Text of one page as produced by a document parser
#[derive(Debug, Clone, PartialEq)]
pub struct PageText {
    /// Page number (1-indexed), None for formats without pages
    pub page_number: Option<u32>,
    /// Extracted text
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_identity_is_basename() {
        assert_eq!(source_identity("files/plans/strength.pdf"), "strength.pdf");
        assert_eq!(source_identity("C:\\docs\\strength.pdf"), "strength.pdf");
        assert_eq!(source_identity("strength.pdf"), "strength.pdf");
    }

    #[test]
    fn test_file_type_detection() {
        assert_eq!(FileType::from_filename("Guide.PDF"), FileType::Pdf);
        assert_eq!(FileType::from_filename("notes.md"), FileType::Markdown);
        assert_eq!(FileType::from_filename("archive"), FileType::Unknown);
        assert!(!FileType::from_filename("sheet.xlsx").is_supported());
    }

    #[test]
    fn test_metadata_page_unknown() {
        let chunk = DocumentChunk {
            text: "Squats build leg strength.".to_string(),
            source_file_path: "guide.txt".to_string(),
            chunk_id: 0,
            file_type: FileType::Txt,
            page_number: None,
            total_chunks: 1,
        };
        let meta = chunk.to_metadata();
        assert_eq!(meta["page_number"], serde_json::json!("unknown"));
        assert_eq!(meta["file_type"], serde_json::json!("txt"));
        assert_eq!(chunk.page_label(), "unknown");
    }
}
