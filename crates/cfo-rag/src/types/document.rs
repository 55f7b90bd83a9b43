//! Document and chunk types with provenance for the metadata store

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Metadata key holding the chunk text
pub const CONTENT_KEY: &str = "content";
/// Metadata key holding the chunk id
pub const CHUNK_ID_KEY: &str = "chunk_id";

/// Document formats the ingestion pipeline can parse
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// PDF document, chunked by word windows
    Pdf,
    /// CSV file, rendered as one markdown table
    Csv,
}

impl DocumentKind {
    /// Detect the document kind from an extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }

    /// Detect the document kind from a path, failing on anything else
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        Self::from_extension(ext).ok_or_else(|| {
            Error::UnsupportedFormat(format!(
                "{} ('{}' has no parser)",
                if ext.is_empty() { "<none>" } else { ext },
                path.display()
            ))
        })
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Csv => "CSV",
        }
    }
}

/// A unit of retrievable text
///
/// The vector index only ever sees `chunk_id`; content and provenance live in
/// the metadata store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Unique chunk ID
    pub chunk_id: Uuid,
    /// Chunk text
    pub content: String,
    /// Caller-supplied provenance (doc_name, source_type, ...)
    pub source_metadata: HashMap<String, String>,
}

impl DocumentChunk {
    /// Create a chunk with a fresh id
    pub fn new(content: String, source_metadata: HashMap<String, String>) -> Self {
        Self {
            chunk_id: Uuid::new_v4(),
            content,
            source_metadata,
        }
    }

    /// Flatten into the record stored under the chunk id
    pub fn to_metadata(&self) -> HashMap<String, String> {
        let mut map = self.source_metadata.clone();
        map.insert(CONTENT_KEY.to_string(), self.content.clone());
        map.insert(CHUNK_ID_KEY.to_string(), self.chunk_id.to_string());
        map
    }

    /// Rebuild a chunk from a metadata record; `None` when content is missing
    pub fn from_metadata(chunk_id: Uuid, mut map: HashMap<String, String>) -> Option<Self> {
        let content = map.remove(CONTENT_KEY)?;
        map.remove(CHUNK_ID_KEY);
        Some(Self {
            chunk_id,
            content,
            source_metadata: map,
        })
    }
}
