//! Recursive-boundary text chunking with overlap
//!
//! Text is cut at the coarsest boundary that yields pieces under the target
//! size: paragraphs, then lines, then sentences, then words, and finally
//! grapheme clusters. Neighbouring pieces are merged back up to the target
//! size, and each new chunk starts with up to `overlap` characters carried
//! over from the end of the previous one.

use std::collections::VecDeque;
use unicode_segmentation::UnicodeSegmentation;

use crate::config::ChunkingConfig;
use crate::types::{DocumentChunk, FileType, PageText};

#[derive(Debug, Clone, Copy)]
enum Boundary {
    Paragraph,
    Line,
    Sentence,
    Word,
    Grapheme,
}

const BOUNDARIES: [Boundary; 5] = [
    Boundary::Paragraph,
    Boundary::Line,
    Boundary::Sentence,
    Boundary::Word,
    Boundary::Grapheme,
];

impl Boundary {
    /// Split keeping separators attached, so concatenating the pieces restores the input
    fn pieces(self, text: &str) -> Vec<&str> {
        match self {
            Boundary::Paragraph => text.split_inclusive("\n\n").collect(),
            Boundary::Line => text.split_inclusive('\n').collect(),
            Boundary::Sentence => text.split_sentence_bounds().collect(),
            Boundary::Word => text.split_word_bounds().collect(),
            Boundary::Grapheme => text.graphemes(true).collect(),
        }
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Text chunker with configurable size and overlap
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Target chunk size in characters
    chunk_size: usize,
    /// Overlap between chunks in characters
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker; overlap is clamped below the chunk size
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size - 1),
        }
    }

    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Split raw text into trimmed, non-empty chunks of at most `chunk_size` characters
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_at_level(text, 0)
            .into_iter()
            .filter(|chunk| !chunk.is_empty())
            .collect()
    }

    /// Chunk every page of a document and stamp identity metadata.
    ///
    /// Pages are split independently so each chunk keeps the page it came
    /// from; `chunk_id` runs over the whole document.
    pub fn chunk_pages(
        &self,
        source_file_path: &str,
        file_type: FileType,
        pages: &[PageText],
    ) -> Vec<DocumentChunk> {
        let texts: Vec<(Option<u32>, String)> = pages
            .iter()
            .flat_map(|page| {
                self.split_text(&page.text)
                    .into_iter()
                    .map(move |text| (page.page_number, text))
            })
            .collect();

        let total_chunks = texts.len() as u32;
        texts
            .into_iter()
            .enumerate()
            .map(|(idx, (page_number, text))| DocumentChunk {
                text,
                source_file_path: source_file_path.to_string(),
                chunk_id: idx as u32,
                file_type,
                page_number,
                total_chunks,
            })
            .collect()
    }

    fn split_at_level(&self, text: &str, level: usize) -> Vec<String> {
        let boundary = BOUNDARIES[level];
        let mut chunks = Vec::new();
        let mut fitting: Vec<&str> = Vec::new();

        for piece in boundary.pieces(text) {
            if char_len(piece) <= self.chunk_size {
                fitting.push(piece);
                continue;
            }

            if !fitting.is_empty() {
                chunks.extend(self.merge(&fitting));
                fitting.clear();
            }
            if level + 1 < BOUNDARIES.len() {
                chunks.extend(self.split_at_level(piece, level + 1));
            } else {
                chunks.push(piece.trim().to_string());
            }
        }

        if !fitting.is_empty() {
            chunks.extend(self.merge(&fitting));
        }
        chunks
    }

    /// Greedily pack pieces into chunks, carrying a tail of up to `overlap` characters
    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);

            if total + len > self.chunk_size && !window.is_empty() {
                let chunk = Self::join(&window);
                if !chunk.is_empty() {
                    chunks.push(chunk);
                }
                while total > self.overlap || (total + len > self.chunk_size && total > 0) {
                    match window.pop_front() {
                        Some((_, dropped)) => total -= dropped,
                        None => break,
                    }
                }
            }

            window.push_back((piece, len));
            total += len;
        }

        let chunk = Self::join(&window);
        if !chunk.is_empty() {
            chunks.push(chunk);
        }
        chunks
    }

    fn join(window: &VecDeque<(&str, usize)>) -> String {
        window
            .iter()
            .map(|(piece, _)| *piece)
            .collect::<String>()
            .trim()
            .to_string()
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::from_config(&ChunkingConfig::default())
    }
}
