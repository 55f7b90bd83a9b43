//! Ingestion pipeline orchestration

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::services::RagServices;
use crate::types::{DocumentChunk, DocumentKind, VectorPoint};

use super::chunker::TextChunker;
use super::parser::FileParser;

/// Outcome of ingesting one document
#[derive(Debug, Clone)]
pub struct IngestReport {
    /// Source path
    pub path: PathBuf,
    /// Detected format
    pub kind: DocumentKind,
    /// Ids of the chunks written, in document order
    pub chunk_ids: Vec<uuid::Uuid>,
    /// Vector dimensionality used for the collection
    pub dimensions: usize,
}

impl IngestReport {
    /// Number of chunks written
    pub fn chunk_count(&self) -> usize {
        self.chunk_ids.len()
    }
}

/// Parse, chunk, embed and store documents
#[derive(Clone)]
pub struct IngestPipeline {
    services: RagServices,
    chunker: TextChunker,
}

impl IngestPipeline {
    /// Create a pipeline with an explicit chunker
    pub fn new(services: RagServices, chunker: TextChunker) -> Self {
        Self { services, chunker }
    }

    /// Create from config
    pub fn from_config(services: RagServices, config: &RagConfig) -> Result<Self> {
        Ok(Self::new(services, TextChunker::from_config(&config.chunking)?))
    }

    /// Split a document into chunk texts according to its kind
    async fn extract_chunks(&self, path: &Path, kind: DocumentKind) -> Result<Vec<String>> {
        let path_buf = path.to_path_buf();
        let chunker = self.chunker.clone();

        tokio::task::spawn_blocking(move || match kind {
            DocumentKind::Pdf => {
                let text = FileParser::parse_pdf(&path_buf)?;
                Ok(chunker.chunk_text(&text))
            }
            DocumentKind::Csv => FileParser::parse_csv(&path_buf),
        })
        .await
        .map_err(|e| Error::internal(format!("Task join error: {}", e)))?
    }

    /// Ingest one PDF or CSV file
    ///
    /// Every chunk gets a fresh id, so ingesting the same file twice stores it twice.
    pub async fn ingest_document(
        &self,
        path: &Path,
        metadata: HashMap<String, String>,
    ) -> Result<IngestReport> {
        let kind = DocumentKind::from_path(path)?;
        tracing::info!("Ingesting {} ({})", path.display(), kind.display_name());

        let texts = self.extract_chunks(path, kind).await?;
        if texts.is_empty() {
            tracing::warn!("{} produced no text, nothing to index", path.display());
            return Ok(IngestReport {
                path: path.to_path_buf(),
                kind,
                chunk_ids: Vec::new(),
                dimensions: self.services.embedder.dimensions(),
            });
        }

        let vectors = self.services.embedder.embed_texts(&texts).await?;
        if vectors.len() != texts.len() {
            return Err(Error::embedding(format!(
                "{} returned {} vectors for {} chunks",
                self.services.embedder.name(),
                vectors.len(),
                texts.len()
            )));
        }
        let dimensions = vectors.first().map(Vec::len).unwrap_or_default();
        self.services.vector_index.init_collection(dimensions).await?;

        let mut chunk_ids = Vec::with_capacity(texts.len());
        let mut points = Vec::with_capacity(texts.len());
        for (text, vector) in texts.into_iter().zip(vectors) {
            let chunk = DocumentChunk::new(text, metadata.clone());
            self.services
                .metadata
                .store_metadata(&chunk.chunk_id, &chunk.to_metadata())
                .await?;
            points.push(VectorPoint::for_chunk(chunk.chunk_id, vector));
            chunk_ids.push(chunk.chunk_id);
        }

        self.services.vector_index.upsert(points).await?;

        tracing::info!(
            "Indexed {} chunks from {} ({} dimensions)",
            chunk_ids.len(),
            path.display(),
            dimensions
        );

        Ok(IngestReport {
            path: path.to_path_buf(),
            kind,
            chunk_ids,
            dimensions,
        })
    }

    /// Drop the vector collection and flush the metadata store
    ///
    /// Each step runs even if the other fails; failures are logged.
    pub async fn clear_all(&self) -> Result<()> {
        let vectors = self.services.vector_index.delete_collection().await;
        if let Err(e) = &vectors {
            tracing::error!("Failed to clear {} index: {}", self.services.vector_index.name(), e);
        }

        let metadata = self.services.metadata.clear().await;
        if let Err(e) = &metadata {
            tracing::error!("Failed to clear {} metadata: {}", self.services.metadata.name(), e);
        }

        if vectors.is_ok() && metadata.is_ok() {
            tracing::info!("Vector index and metadata store cleared");
        }
        vectors.and(metadata)
    }
}
