//! Document ingestion: parsing, chunking, embedding and storage

mod chunker;
mod parser;
mod processor;

pub use chunker::{chunk_text, TextChunker};
pub use parser::FileParser;
pub use processor::{IngestPipeline, IngestReport};
