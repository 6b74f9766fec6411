//! Document ingestion: parse, chunk, embed and index

mod chunker;
mod parser;
mod processor;

pub use chunker::TextChunker;
pub use parser::{cleanup_pdf_text, DocumentParser, FileParser};
pub use processor::{IndexLock, IngestPipeline, IngestReport};
